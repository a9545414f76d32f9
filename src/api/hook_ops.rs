use tracing::{debug, info, warn};

use super::RedirectionApi;
use crate::{
    backend::GraphStore,
    errors::Result,
    lookup::{reject_conflict, require_found, require_id, require_present},
    model::{FailurePolicyType, InspectionHook, NetworkElement, TagEncapsulationType},
};

impl<S: GraphStore> RedirectionApi<S> {
    /// Binds `inspected` to the chain named by `inspection_port` and returns the
    /// new hook id.
    ///
    /// `tag`, `enc_type`, `order` and `failure_policy` are accepted and ignored.
    pub fn install_inspection_hook(
        &self,
        inspected: Option<&NetworkElement>,
        inspection_port: Option<&NetworkElement>,
        tag: Option<u64>,
        enc_type: Option<TagEncapsulationType>,
        order: Option<u64>,
        failure_policy: Option<FailurePolicyType>,
    ) -> Result<String> {
        let inspected = require_present(inspected, "Inspected port")?;
        let inspected_id = require_id(inspected.id(), "Inspected port")?;
        let chain_ref = require_present(inspection_port, "Inspection port")?;
        let chain_id = require_id(chain_ref.id(), "Inspection port")?;
        info!(inspected = %inspected_id, chain = %chain_id, "installing inspection hook");
        debug!(?tag, ?enc_type, ?order, ?failure_policy, "ignoring unsupported hook attributes");

        self.store().required(|| {
            let lookup = self.lookup();
            require_found(lookup.find_chain(chain_id)?, "Service Function Chain", chain_id)?;
            if lookup
                .find_hook_by_inspected_and_chain(inspected_id, chain_id)?
                .is_some()
            {
                return Err(reject_conflict(format!(
                    "Found existing inspection hook (Inspected {inspected_id} ; Inspection Port {chain_id})"
                )));
            }
            let hook = self.store().create_hook(inspected, chain_id)?;
            require_id(hook.id(), "Inspection Hook").map(str::to_string)
        })
    }

    /// Re-points an installed hook at another chain. The inspected element
    /// cannot change.
    pub fn update_inspection_hook(&self, hook: Option<&InspectionHook>) -> Result<()> {
        let hook = require_present(hook, "Inspection Hook")?;
        let hook_id = require_id(hook.id(), "Inspection Hook")?;
        let inspected = require_present(hook.inspected_port.as_ref(), "Inspected port")?;
        let chain_id = require_id(hook.inspection_port(), "Inspection port")?;
        info!(hook = %hook_id, chain = %chain_id, "updating inspection hook");

        self.store().required(|| {
            let lookup = self.lookup();
            let existing = require_found(lookup.find_hook(hook_id)?, "Inspection Hook", hook_id)?;
            if existing.inspected_id() != inspected.id() {
                return Err(reject_conflict(format!(
                    "Cannot update Inspected Port from {} to {} for the Inspection hook {hook_id}",
                    existing.inspected_id().unwrap_or("null"),
                    inspected.id().unwrap_or("null"),
                )));
            }
            require_found(lookup.find_chain(chain_id)?, "Service Function Chain", chain_id)?;

            let current = lookup.find_chain_containing_hook(hook_id)?;
            if current.as_ref().map(|chain| chain.element_id.as_str()) == Some(chain_id) {
                debug!(hook = %hook_id, chain = %chain_id, "inspection hook already on chain");
                return Ok(());
            }
            if let Some(inspected_id) = inspected.id()
                && let Some(other) = lookup.find_hook_by_inspected_and_chain(inspected_id, chain_id)?
                && other.id() != Some(hook_id)
            {
                return Err(reject_conflict(format!(
                    "Found existing inspection hook (Inspected {inspected_id} ; Inspection Port {chain_id})"
                )));
            }
            self.store().update_hook_chain(hook_id, chain_id).map(|_| ())
        })
    }

    /// Detaches and deletes the hook with its inspected element. Unknown or
    /// missing ids are not an error.
    pub fn remove_inspection_hook(&self, hook_id: Option<&str>) -> Result<()> {
        let Some(hook_id) = hook_id else {
            warn!("no inspection hook id given to remove");
            return Ok(());
        };
        info!(hook = %hook_id, "removing inspection hook");
        self.store().required(|| {
            if self.lookup().find_hook(hook_id)?.is_none() {
                warn!(hook = %hook_id, "inspection hook not found, nothing to remove");
                return Ok(());
            }
            self.store().delete_hook(hook_id)
        })
    }

    pub fn get_inspection_hook(&self, hook_id: Option<&str>) -> Result<Option<InspectionHook>> {
        let Some(hook_id) = hook_id else {
            warn!("no inspection hook id given to look up");
            return Ok(None);
        };
        self.lookup().find_hook(hook_id)
    }
}
