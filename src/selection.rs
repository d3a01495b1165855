//! Storage policy evaluation: narrows the registered contracts for a
//! requested type down to exactly one.

use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::constructor::Constructor;
use crate::descriptors::ContractDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::policy::StoragePolicy;
use crate::registration::OwnerCandidate;

/// Caller-supplied selector used when several contracts qualify.
pub type TieBreak = Arc<dyn Fn(&[ContractDescriptor]) -> Option<&ContractDescriptor> + Send + Sync>;

/// The single contract picked for a resolution.
#[derive(Clone)]
pub(crate) struct Selection {
    pub(crate) owner: TypeKey,
    pub(crate) descriptor: ContractDescriptor,
    pub(crate) constructors: Arc<Vec<Constructor>>,
    /// Policy that governs storage for this resolution.
    pub(crate) policy: StoragePolicy,
}

pub(crate) fn select(
    requested: TypeKey,
    mut candidates: Vec<OwnerCandidate>,
    policy: StoragePolicy,
    tie_break: Option<&TieBreak>,
    config: &ContainerConfig,
) -> DiResult<Selection> {
    if candidates.is_empty() {
        return Err(DiError::NotRegistered(requested.name()));
    }

    if candidates.len() > 1 {
        if config.throw_when_more_than_one_owner_contract {
            return Err(DiError::AmbiguousOwner {
                requested: requested.name(),
                owners: candidates.iter().map(|c| c.owner.name()).collect(),
            });
        }
        tracing::warn!(
            requested = requested.name(),
            owners = candidates.len(),
            chosen = candidates[0].owner.name(),
            "several owners registered for the requested type; using the first"
        );
    }

    let OwnerCandidate {
        owner,
        descriptors,
        constructors,
    } = candidates.swap_remove(0);

    let mut qualifying: Vec<ContractDescriptor> = descriptors
        .iter()
        .filter(|d| d.policy.admits(policy))
        .cloned()
        .collect();

    if qualifying.is_empty() {
        if config.throw_on_storage_rule_coercion {
            return Err(DiError::StoragePolicyMismatch {
                requested: requested.name(),
                policy,
            });
        }
        tracing::warn!(
            requested = requested.name(),
            policy = %policy,
            "no contract with the requested storage policy; coercing to the registered one"
        );
        qualifying = descriptors;
    }

    let descriptor = match qualifying.len() {
        0 => return Err(DiError::NotRegistered(requested.name())),
        1 => qualifying.swap_remove(0),
        count => {
            let picked = tie_break.and_then(|choose| choose(qualifying.as_slice()).cloned());
            match picked {
                Some(descriptor) => descriptor,
                None if config.throw_on_multiple_resolutions => {
                    return Err(DiError::AmbiguousResolution {
                        requested: requested.name(),
                        candidates: count,
                    });
                }
                None => {
                    tracing::warn!(
                        requested = requested.name(),
                        candidates = count,
                        "several contracts qualify; using the first"
                    );
                    qualifying.swap_remove(0)
                }
            }
        }
    };

    // Assignability: the descriptor must have been built for this owner and
    // this requested type, otherwise its cast cannot be trusted.
    if descriptor.owner != owner || descriptor.requested != requested {
        return Err(DiError::TypeMismatch {
            owner: owner.name(),
            requested: requested.name(),
        });
    }

    Ok(Selection {
        owner,
        policy: descriptor.policy.effective(policy),
        descriptor,
        constructors,
    })
}
