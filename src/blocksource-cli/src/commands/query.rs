//! Layout query command handlers
//!
//! Loads a layout document and reports source info for blocks and addresses.

use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use blocksource::{Address, Layout, MemoryMap, SourceInfo, SourceSummary};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Read, parse and validate a layout file
pub fn load_map(path: &Path) -> Result<MemoryMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout: {}", path.display()))?;

    let layout = Layout::from_str_for_path(path, &text)
        .with_context(|| format!("Failed to parse layout: {}", path.display()))?;

    let map = layout
        .build()
        .with_context(|| format!("Invalid layout: {}", path.display()))?;

    tracing::info!(
        "Loaded {} blocks from {}",
        map.blocks().len(),
        path.display()
    );
    Ok(map)
}

#[derive(Debug, Serialize)]
struct BlockReport {
    name: String,
    start: Address,
    end: Address,
    length: u64,
    sources: Vec<SourceSummary>,
}

#[derive(Debug, Serialize)]
struct LocateReport {
    address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_bytes_offset: Option<u64>,
    source: SourceSummary,
}

fn source_line(info: &SourceInfo<'_>) -> Result<String> {
    let mut line = format!(
        "  {} - {}  {:<14} {}",
        info.min_address(),
        info.max_address(),
        info.sub_block().kind().name(),
        info.description()
    );
    if let Some(range) = info.mapped_range() {
        write!(line, "  -> {}", range)?;
    }
    Ok(line.trim_end().to_string())
}

pub fn render_blocks(map: &MemoryMap, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let reports: Vec<BlockReport> = map
                .blocks()
                .iter()
                .map(|block| BlockReport {
                    name: block.name().to_string(),
                    start: block.start(),
                    end: block.end(),
                    length: block.length(),
                    sources: block.source_infos().map(|info| info.summary()).collect(),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&reports)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for block in map.blocks() {
                writeln!(
                    out,
                    "{}  {} - {}  ({} bytes)",
                    block.name(),
                    block.start(),
                    block.end(),
                    block.length()
                )?;
                for info in block.source_infos() {
                    writeln!(out, "{}", source_line(&info)?)?;
                }
            }
            Ok(out)
        }
    }
}

pub fn render_locate(map: &MemoryMap, address: Address, format: OutputFormat) -> Result<String> {
    let Some(info) = map.source_info_at(address) else {
        bail!("No block contains address {}", address);
    };
    let file_bytes_offset = info.file_bytes_offset_at(address);

    match format {
        OutputFormat::Json => {
            let report = LocateReport {
                address,
                file_bytes_offset,
                source: info.summary(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "Address: {}", address)?;
            writeln!(out, "Block:   {}", info.block().name())?;
            writeln!(out, "Source:  {}", info)?;
            writeln!(out, "Kind:    {}", info.sub_block().kind().name())?;
            if !info.description().is_empty() {
                writeln!(out, "Detail:  {}", info.description())?;
            }
            if let (Some(bytes), Some(offset)) = (info.file_bytes(), file_bytes_offset) {
                writeln!(out, "File:    {} offset {:#x}", bytes.filename(), offset)?;
            }
            if let Some(range) = info.mapped_range() {
                writeln!(out, "Mapped:  {}", range)?;
            }
            Ok(out)
        }
    }
}

/// Handle the blocks command
pub fn blocks(layout: &Path, format: OutputFormat) -> Result<()> {
    let map = load_map(layout)?;
    println!("{}", render_blocks(&map, format)?.trim_end());
    Ok(())
}

/// Handle the locate command
pub fn locate(layout: &Path, address: &str, format: OutputFormat) -> Result<()> {
    let address: Address = address
        .parse()
        .with_context(|| format!("Invalid address: {}", address))?;
    let map = load_map(layout)?;
    println!("{}", render_locate(&map, address, format)?.trim_end());
    Ok(())
}
