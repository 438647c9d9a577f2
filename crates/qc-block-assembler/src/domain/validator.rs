//! Transaction validation
//!
//! A simplified conservation check, not a balance equation: every input's
//! previous value must exceed the record's *total* output value. Already
//! claimed inputs are not subtracted.

use super::entities::TransactionRecord;
use thiserror::Error;

/// Why a record was dropped
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Record has no inputs sequence
    #[error("record has no inputs")]
    MissingInputs,

    /// Record has no outputs sequence
    #[error("record has no outputs")]
    MissingOutputs,

    /// Input lacks a previous output value
    #[error("input {input} has no previous output value")]
    MissingPrevout {
        /// Input index
        input: usize,
    },

    /// Input's previous value does not exceed the total output value
    #[error("input {input} spends {prev_value} but outputs total {total_out}")]
    Overspend {
        /// Input index
        input: usize,
        /// Referenced previous value
        prev_value: u64,
        /// Sum of all outputs of the record
        total_out: u128,
    },

    /// Input has an empty spending identifier
    #[error("input {input} has an empty txid")]
    EmptySpendingTxid {
        /// Input index
        input: usize,
    },
}

/// Pure predicate over a single record
pub struct TransactionValidator;

impl TransactionValidator {
    /// Whether the record may enter the block
    pub fn is_valid(record: &TransactionRecord) -> bool {
        Self::check(record).is_ok()
    }

    /// First violation found, checking inputs in order
    pub fn check(record: &TransactionRecord) -> Result<(), RejectReason> {
        let inputs = record.vin.as_ref().ok_or(RejectReason::MissingInputs)?;
        let total_out = record
            .total_output_value()
            .ok_or(RejectReason::MissingOutputs)?;

        for (index, input) in inputs.iter().enumerate() {
            let prev_value = input
                .prev_value()
                .ok_or(RejectReason::MissingPrevout { input: index })?;

            if u128::from(prev_value) <= total_out {
                return Err(RejectReason::Overspend {
                    input: index,
                    prev_value,
                    total_out,
                });
            }

            if input.txid.is_empty() {
                return Err(RejectReason::EmptySpendingTxid { input: index });
            }
        }

        Ok(())
    }
}
