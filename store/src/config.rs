//! Governance configuration storage trait.

use crate::StoreError;
use tfgov_types::GovernanceConfig;

/// Read access to the configuration singleton.
pub trait ConfigStore {
    /// The persisted configuration, or `None` before the first `setconfig`.
    fn get_config(&self) -> Result<Option<GovernanceConfig>, StoreError>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get_config(&self) -> Result<Option<GovernanceConfig>, StoreError> {
        (**self).get_config()
    }
}
