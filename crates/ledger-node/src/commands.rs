//! Sub-commands. Every command prints JSON to stdout.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use ledger_chain::service::MAX_PAGE_LIMIT;
use ledger_chain::LedgerChainApi;
use ledger_registry::RegistryApi;
use serde::Serialize;

use crate::node::{read_record, LedgerNode};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Re-derive every block and report problems. Exits non-zero on failure.
    Validate,
    /// Block counts by type, signed and encrypted totals.
    Stats,
    /// One block with its signature check.
    Block {
        index: u64,
    },
    /// Blocks newest first.
    Blocks {
        /// Only blocks of this data type.
        #[arg(long = "type")]
        data_type: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Register a record read from a JSON file.
    Register {
        #[arg(long = "type", default_value = "invoice")]
        entity_type: String,
        entity_id: u64,
        file: PathBuf,
    },
    /// Check a record read from a JSON file against its registration.
    Verify {
        entity_id: u64,
        file: PathBuf,
    },
    /// Entity history, oldest first.
    Audit {
        entity_id: u64,
    },
}

impl Command {
    pub async fn run(self, node: &LedgerNode) -> Result<()> {
        let _span = ledger_telemetry::ledger_span!("command", name = self.name()).entered();

        match self {
            Command::Validate => {
                let report = node.chain().validate_chain();
                print_json(&report)?;
                if !report.valid {
                    bail!("chain failed validation with {} issue(s)", report.errors.len());
                }
            }
            Command::Stats => print_json(&node.chain().stats())?,
            Command::Block { index } => print_json(&node.chain().get_block(index)?)?,
            Command::Blocks {
                data_type,
                offset,
                limit,
            } => {
                if limit > MAX_PAGE_LIMIT {
                    tracing::warn!("[node] limit {} capped at {}", limit, MAX_PAGE_LIMIT);
                }
                print_json(&node.chain().list_blocks(data_type.as_deref(), offset, limit))?
            }
            Command::Register {
                entity_type,
                entity_id,
                file,
            } => {
                let record = read_record(&file)?;
                node.stage_record(&entity_type, entity_id, record.clone());
                let receipt = node.registry().register(&entity_type, entity_id, record).await?;
                ledger_telemetry::log_block_event!(
                    info,
                    "registered",
                    receipt.block_index,
                    receipt.block_hash,
                    entity_id = entity_id
                );
                print_json(&receipt)?;
            }
            Command::Verify { entity_id, file } => {
                let entry = node.registry().entry(entity_id).await?;
                node.stage_record(&entry.entity_type, entity_id, read_record(&file)?);
                let outcome = node.registry().verify(entity_id).await?;
                print_json(&outcome)?;
                if !outcome.verified {
                    bail!("entity {entity_id} does not match its registration");
                }
            }
            Command::Audit { entity_id } => {
                print_json(&node.registry().audit_trail(entity_id).await?)?
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Validate => "validate",
            Command::Stats => "stats",
            Command::Block { .. } => "block",
            Command::Blocks { .. } => "blocks",
            Command::Register { .. } => "register",
            Command::Verify { .. } => "verify",
            Command::Audit { .. } => "audit",
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
