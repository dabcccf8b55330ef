//! Display formatting for API resources

use crate::client::models::{
    Application, ApplicationBundle, AvailabilityZone, Cluster, ControlPlane, ExternalNetwork,
    Flavor, Image, KeyPair, Project,
};

/// Resources shown by their name
pub trait Named {
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Named for $ty {
                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

impl_named!(
    Application,
    ApplicationBundle,
    AvailabilityZone,
    Cluster,
    ControlPlane,
    ExternalNetwork,
    Flavor,
    Image,
    KeyPair,
    Project,
);

pub fn named_object<T: Named + ?Sized>(object: &T) -> &str {
    object.name()
}

/// Bundle version, flagged when it is a preview or has an end of life
pub fn application_bundle(bundle: &ApplicationBundle) -> String {
    if bundle.preview {
        format!("{} (Preview)", bundle.version)
    } else if let Some(eol) = bundle.end_of_life {
        format!("{} (EOL {})", bundle.version, eol.format("%a %b %d %Y"))
    } else {
        bundle.version.clone()
    }
}

/// `name (cpus core, memoryGi[, gpus GPU])`
pub fn flavor(flavor: &Flavor) -> String {
    if flavor.gpus > 0 {
        format!(
            "{} ({} core, {}Gi, {} GPU)",
            flavor.name, flavor.cpus, flavor.memory, flavor.gpus
        )
    } else {
        format!("{} ({} core, {}Gi)", flavor.name, flavor.cpus, flavor.memory)
    }
}
