//! Navigation menu and the persisted selection
//!
//! The menu tree is fixed when a [`Navigation`] is built. The selected
//! entry is persisted and always refers to a leaf of that tree: a stale
//! selection is replaced by the default and the correction is written back.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::store::{
    ChangeKind, Persisted, Storage, StoreError, StringCodec, StringStore, SubscriberId,
};

/// Storage key of the selected menu entry
pub const NAVIGATION_KEY: &str = "navigation";

/// Menu error type
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("duplicate menu id: {0}")]
    DuplicateId(String),

    #[error("unknown menu entry: {0}")]
    UnknownEntry(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Menu entry; a leaf has no children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: String,

    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expanded: bool,
}

impl MenuNode {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            icon: None,
            link: None,
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check that every id in the tree is unique
    pub fn validate(&self) -> Result<(), MenuError> {
        fn walk<'a>(node: &'a MenuNode, seen: &mut HashSet<&'a str>) -> Result<(), MenuError> {
            if !seen.insert(node.id.as_str()) {
                return Err(MenuError::DuplicateId(node.id.clone()));
            }
            node.children.iter().try_for_each(|child| walk(child, seen))
        }

        walk(self, &mut HashSet::new())
    }

    /// Whether `id` names a leaf of this tree
    pub fn contains_leaf(&self, id: &str) -> bool {
        breadcrumbs(self, id).is_some()
    }
}

/// The console's main menu
pub fn default_menu() -> MenuNode {
    MenuNode::new("root", "").with_children(vec![
        MenuNode::new("dashboard", "Dashboard")
            .with_icon("ri:dashboard-3-line")
            .with_link("/"),
        MenuNode::new("kubernetes", "Kubernetes")
            .with_icon("mdi:kubernetes")
            .with_children(vec![
                MenuNode::new("kubernetes-control-planes", "Control Planes")
                    .with_link("/kubernetes/controlplanes"),
                MenuNode::new("kubernetes-clusters", "Clusters")
                    .with_link("/kubernetes/clusters"),
            ]),
    ])
}

/// Path from `root` down to the leaf `id`, depth first; None if absent
pub fn breadcrumbs(root: &MenuNode, id: &str) -> Option<Vec<MenuNode>> {
    fn walk<'a>(node: &'a MenuNode, id: &str, trail: &mut Vec<&'a MenuNode>) -> bool {
        trail.push(node);
        if node.is_leaf() {
            if node.id == id {
                return true;
            }
        } else if node.children.iter().any(|child| walk(child, id, trail)) {
            return true;
        }
        trail.pop();
        false
    }

    let mut trail = Vec::new();
    if walk(root, id, &mut trail) {
        Some(trail.into_iter().map(shallow).collect())
    } else {
        None
    }
}

/// Copy of the tree with every ancestor of the leaf `id` expanded
pub fn expanded(root: &MenuNode, id: &str) -> MenuNode {
    fn expand(node: &mut MenuNode, id: &str) -> bool {
        if node.is_leaf() {
            return node.id == id;
        }
        if node.children.iter_mut().any(|child| expand(child, id)) {
            node.expanded = true;
            return true;
        }
        false
    }

    let mut copy = root.clone();
    expand(&mut copy, id);
    copy
}

// Breadcrumb entries carry the node itself, not its subtree.
fn shallow(node: &MenuNode) -> MenuNode {
    MenuNode {
        children: Vec::new(),
        ..node.clone()
    }
}

/// Menu tree plus the persisted selection
pub struct Navigation {
    menu: MenuNode,
    default_id: String,
    selected: StringStore,
}

impl Navigation {
    /// Build navigation over `menu`, falling back to `default_id` whenever the
    /// persisted selection is missing or stale
    pub fn new(
        menu: MenuNode,
        default_id: impl Into<String>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, MenuError> {
        menu.validate()?;

        let default_id = default_id.into();
        if !menu.contains_leaf(&default_id) {
            return Err(MenuError::UnknownEntry(default_id));
        }

        let selected = Persisted::open_or(
            NAVIGATION_KEY,
            storage,
            StringCodec,
            default_id.clone(),
        )?;

        Ok(Self {
            menu,
            default_id,
            selected,
        })
    }

    pub fn menu_tree(&self) -> &MenuNode {
        &self.menu
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Selected entry as persisted, without correction
    pub fn selected(&self) -> Option<String> {
        self.selected.get()
    }

    /// Persist a new selection; only leaves can be selected
    pub fn select(&self, id: &str) -> Result<(), MenuError> {
        if !self.menu.contains_leaf(id) {
            return Err(MenuError::UnknownEntry(id.to_string()));
        }
        self.selected.set(id.to_string())?;
        Ok(())
    }

    /// Selected entry, resetting a stale selection to the default
    pub fn fix_id(&self) -> Result<String, MenuError> {
        match self.selected.get() {
            Some(id) if self.menu.contains_leaf(&id) => Ok(id),
            stale => {
                tracing::info!(
                    "Navigation entry {:?} no longer exists, resetting to {}",
                    stale,
                    self.default_id
                );
                self.selected.set(self.default_id.clone())?;
                Ok(self.default_id.clone())
            }
        }
    }

    /// Breadcrumb trail of the (corrected) selection
    pub fn breadcrumbs(&self) -> Result<Vec<MenuNode>, MenuError> {
        let id = self.fix_id()?;
        breadcrumbs(&self.menu, &id).ok_or(MenuError::UnknownEntry(id))
    }

    /// Menu with the (corrected) selection expanded
    pub fn menu(&self) -> Result<MenuNode, MenuError> {
        let id = self.fix_id()?;
        Ok(expanded(&self.menu, &id))
    }

    pub fn subscribe<F>(&self, run: F) -> SubscriberId
    where
        F: Fn(Option<&String>, ChangeKind) + Send + Sync + 'static,
    {
        self.selected.subscribe(run)
    }

    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        self.selected.unsubscribe(id)
    }

    pub(crate) fn clear_subscribers(&self) {
        self.selected.clear_subscribers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn ids(trail: &[MenuNode]) -> Vec<&str> {
        trail.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_breadcrumbs_to_nested_leaf() {
        let menu = default_menu();
        let trail = breadcrumbs(&menu, "kubernetes-clusters").unwrap();
        assert_eq!(ids(&trail), vec!["root", "kubernetes", "kubernetes-clusters"]);
        assert!(trail.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_breadcrumbs_only_match_leaves() {
        let menu = default_menu();
        assert!(breadcrumbs(&menu, "kubernetes").is_none());
        assert!(breadcrumbs(&menu, "missing").is_none());
        assert_eq!(
            ids(&breadcrumbs(&menu, "dashboard").unwrap()),
            vec!["root", "dashboard"]
        );
    }

    #[test]
    fn test_expanded_marks_ancestors() {
        let menu = default_menu();
        let tree = expanded(&menu, "kubernetes-control-planes");

        assert!(tree.expanded);
        let kubernetes = &tree.children[1];
        assert!(kubernetes.expanded);
        assert!(!tree.children[0].expanded);
        assert!(!kubernetes.children[0].expanded);

        // The source tree is untouched.
        assert!(!menu.expanded);
    }

    #[test]
    fn test_expanded_unknown_id_expands_nothing() {
        let tree = expanded(&default_menu(), "missing");
        assert!(!tree.expanded);
        assert!(tree.children.iter().all(|c| !c.expanded));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let menu = MenuNode::new("root", "").with_children(vec![
            MenuNode::new("a", "A"),
            MenuNode::new("b", "B").with_children(vec![MenuNode::new("a", "A again")]),
        ]);
        assert!(matches!(menu.validate(), Err(MenuError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_navigation_defaults_selection() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let nav = Navigation::new(default_menu(), "dashboard", storage.clone()).unwrap();

        assert_eq!(nav.selected().as_deref(), Some("dashboard"));
        assert_eq!(
            storage.get(NAVIGATION_KEY).unwrap().as_deref(),
            Some("dashboard")
        );
    }

    #[test]
    fn test_stale_selection_is_corrected_and_persisted() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(NAVIGATION_KEY, "kubernetes-removed").unwrap();

        let nav = Navigation::new(default_menu(), "dashboard", storage.clone()).unwrap();
        let trail = nav.breadcrumbs().unwrap();

        assert_eq!(ids(&trail), vec!["root", "dashboard"]);
        assert_eq!(
            storage.get(NAVIGATION_KEY).unwrap().as_deref(),
            Some("dashboard")
        );
    }

    #[test]
    fn test_select_rejects_unknown_and_branch_entries() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let nav = Navigation::new(default_menu(), "dashboard", storage).unwrap();

        assert!(matches!(nav.select("kubernetes"), Err(MenuError::UnknownEntry(_))));
        nav.select("kubernetes-clusters").unwrap();

        let menu = nav.menu().unwrap();
        assert!(menu.children[1].expanded);
    }

    #[test]
    fn test_unknown_default_rejected() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        assert!(matches!(
            Navigation::new(default_menu(), "nowhere", storage),
            Err(MenuError::UnknownEntry(_))
        ));
    }
}
