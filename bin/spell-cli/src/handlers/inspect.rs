use std::fs;

use anyhow::{Context, Result};
use spell_package_primitives::codec::TransactionTemplate;

use crate::cli::InspectArgs;

pub(crate) fn handle_inspect(args: InspectArgs) -> Result<()> {
    let hex = match (args.hex, args.file) {
        (Some(hex), _) => hex,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("read transaction file {}", path.display()))?,
        (None, None) => anyhow::bail!("either --hex or --file is required"),
    };

    let template = TransactionTemplate::decode_hex(&hex).context("decode transaction")?;
    print!("{}", describe(&template));

    Ok(())
}

/// A human-readable summary of `template`.
fn describe(template: &TransactionTemplate) -> String {
    let mut out = format!("txid: {}\n", template.txid());

    out.push_str(&format!("inputs ({}):\n", template.inputs().len()));
    for input in template.inputs() {
        let witness = match input.existing_witness {
            Some(witness) => {
                let sizes = witness.iter().map(<[u8]>::len).collect::<Vec<_>>();
                format!("witness {sizes:?}")
            }
            None => "unsigned".to_string(),
        };
        out.push_str(&format!(
            "  #{} {} sequence={:#x} {witness}\n",
            input.index,
            input.prev_ref,
            input.sequence.to_consensus_u32()
        ));
    }

    out.push_str(&format!("outputs ({}):\n", template.outputs().len()));
    for (vout, output) in template.outputs().enumerate() {
        out.push_str(&format!(
            "  #{vout} {} {}\n",
            output.value.display_dynamic(),
            output.script.to_hex_string()
        ));
    }

    out
}
