//! Classification of template inputs by the role they play in a signing phase.

use std::{collections::BTreeMap, fmt};

use bitcoin::Witness;
use spell_package_primitives::{codec::TransactionTemplate, provenance::ResolvedOutput};
use tracing::trace;

use crate::{
    context::SigningContext,
    errors::{BuildError, BuildResult},
};

/// The role an input plays in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputRole {
    /// The input this phase requests a fresh signature for.
    SigningTarget,

    /// Spends the anchor UTXO.
    Anchor,

    /// Spends the funding UTXO.
    Funding,

    /// Spends the output produced by the previous phase.
    PriorPhaseOutput,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SigningTarget => "signing-target",
            Self::Anchor => "anchor",
            Self::Funding => "funding",
            Self::PriorPhaseOutput => "prior-phase-output",
        };

        f.write_str(s)
    }
}

/// An input of a template together with the output it spends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedInput {
    /// Position of the input in the template.
    pub index: usize,

    /// The role the input plays.
    pub role: InputRole,

    /// The output the input spends, as resolved from its provenance.
    pub prevout: ResolvedOutput,

    /// The witness the template already carries for this input, if non-empty.
    pub existing_witness: Option<Witness>,
}

impl ClassifiedInput {
    /// Whether the input is already authenticated by its template witness.
    pub const fn is_presatisfied(&self) -> bool {
        self.existing_witness.is_some()
    }
}

/// Assigns a role to every input of `template`.
///
/// Each input's previous txid is compared in both byte orders, first against `target` and then
/// against the anchor, funding and prior phase output of `ctx`, in that order. The first match
/// wins. An input matching nothing, or a template that never spends `target`, is an
/// [`BuildError::InputNotFound`]; two inputs spending the same UTXO are a
/// [`BuildError::DuplicateInput`].
pub fn classify(
    template: &TransactionTemplate,
    target: &ResolvedOutput,
    ctx: &SigningContext,
) -> BuildResult<Vec<ClassifiedInput>> {
    let mut seen: BTreeMap<InputRole, usize> = BTreeMap::new();
    let mut classified = Vec::with_capacity(template.inputs().len());

    for input in template.inputs() {
        let outpoint = input.prev_ref.to_outpoint();

        let (role, prevout) = if target.utxo.matches(&outpoint) {
            (InputRole::SigningTarget, target)
        } else {
            ctx.known()
                .find(|(_, known)| known.utxo.matches(&outpoint))
                .ok_or(BuildError::InputNotFound {
                    utxo: input.prev_ref,
                    index: Some(input.index),
                })?
        };

        if let Some(first) = seen.insert(role, input.index) {
            return Err(BuildError::DuplicateInput {
                utxo: prevout.utxo,
                first,
                second: input.index,
            });
        }

        trace!(index = input.index, %role, utxo = %prevout.utxo, "classified input");

        classified.push(ClassifiedInput {
            index: input.index,
            role,
            prevout: prevout.clone(),
            existing_witness: input.existing_witness.cloned(),
        });
    }

    if !seen.contains_key(&InputRole::SigningTarget) {
        return Err(BuildError::InputNotFound {
            utxo: target.utxo,
            index: None,
        });
    }

    Ok(classified)
}
