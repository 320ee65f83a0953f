//! Turning indexer records into explorer views
//!
//! Output classification precedence: data-carrying scripts first (RANK
//! payload or nothing), then address-type scripts, then pass-through.

use num::{BigUint, Zero};

use crate::error::{ExplorerError, Result};
use crate::rank;
use crate::script::ScriptCodec;
use crate::types::{
    EnrichedInput, EnrichedOutput, ExplorerBlock, ExplorerTx, IndexedBlock, IndexedTx,
    OutputClass, TxInput, TxOutput,
};

pub fn classify_output(codec: &ScriptCodec, output_script: &str) -> OutputClass {
    let Some(script) = ScriptCodec::parse_hex(output_script) else {
        return OutputClass::Plain;
    };

    if ScriptCodec::is_data_carrying(&script) {
        return match rank::decode(&script) {
            Ok(payload) => OutputClass::SpecialPayload(payload),
            Err(e) => {
                log::trace!("OP_RETURN left unenriched: {}", e);
                OutputClass::Plain
            }
        };
    }

    match codec.address_from_script(&script) {
        Some(address) => OutputClass::Address(address),
        None => OutputClass::Plain,
    }
}

pub fn enrich_output(codec: &ScriptCodec, output: TxOutput) -> EnrichedOutput {
    let class = classify_output(codec, &output.output_script);
    EnrichedOutput { output, class }
}

pub fn enrich_input(codec: &ScriptCodec, input: TxInput) -> EnrichedInput {
    let address = input.output_script.as_deref().map(|hex_script| {
        ScriptCodec::parse_hex(hex_script).and_then(|script| codec.address_from_script(&script))
    });
    EnrichedInput { input, address }
}

fn is_data_carrying_hex(output_script: &str) -> bool {
    ScriptCodec::parse_hex(output_script)
        .map(|script| ScriptCodec::is_data_carrying(&script))
        .unwrap_or(false)
}

/// Exact sum of positive values sent to data-carrying outputs
pub fn sum_burned_sats(outputs: &[TxOutput]) -> BigUint {
    outputs
        .iter()
        .filter(|output| output.value > 0 && is_data_carrying_hex(&output.output_script))
        .fold(BigUint::zero(), |acc, output| acc + BigUint::from(output.value))
}

/// Blocks from the containing block to the tip, inclusive; 0 if unconfirmed
pub fn confirmations(tip_height: u64, block_height: Option<u64>) -> u64 {
    match block_height {
        Some(height) => (tip_height + 1).saturating_sub(height),
        None => 0,
    }
}

pub fn enrich_tx(codec: &ScriptCodec, tx: IndexedTx, tip_height: u64) -> ExplorerTx {
    let IndexedTx {
        txid,
        inputs,
        outputs,
        block,
        time_first_seen,
        extra,
    } = tx;

    let sum_burned_sats = sum_burned_sats(&outputs).to_string();
    let confirmations = confirmations(tip_height, block.as_ref().map(|b| b.height));

    ExplorerTx {
        txid,
        block,
        time_first_seen,
        extra,
        inputs: inputs.into_iter().map(|i| enrich_input(codec, i)).collect(),
        outputs: outputs.into_iter().map(|o| enrich_output(codec, o)).collect(),
        confirmations,
        sum_burned_sats,
    }
}

/// Address paid by the coinbase's second output
///
/// Fails instead of guessing when the coinbase does not have that shape.
pub fn mined_by(codec: &ScriptCodec, block: &IndexedBlock) -> Result<String> {
    let height = block.block_info.height;
    let coinbase = block.txs.first().ok_or_else(|| {
        ExplorerError::DataIntegrity(format!("block {} has no coinbase transaction", height))
    })?;

    let payout = coinbase.outputs.get(1).ok_or_else(|| {
        ExplorerError::DataIntegrity(format!(
            "coinbase of block {} has {} output(s), expected at least 2",
            height,
            coinbase.outputs.len()
        ))
    })?;

    ScriptCodec::parse_hex(&payout.output_script)
        .and_then(|script| codec.address_from_script(&script))
        .ok_or_else(|| {
            ExplorerError::DataIntegrity(format!(
                "coinbase payout script of block {} is not an address: {}",
                height, payout.output_script
            ))
        })
}

pub fn enrich_block(codec: &ScriptCodec, block: IndexedBlock, tip_height: u64) -> Result<ExplorerBlock> {
    let mined_by = mined_by(codec, &block)?;
    let IndexedBlock {
        block_info,
        txs,
        extra,
    } = block;

    Ok(ExplorerBlock {
        block_info,
        extra,
        txs: txs
            .into_iter()
            .map(|tx| enrich_tx(codec, tx, tip_height))
            .collect(),
        mined_by,
    })
}
