//! Parser for the wgrib2 "short" inventory format.
//!
//! Each line is `record:offset:d=YYYYMMDDHH:parameter:layer:type:fac[:...]`.
//! Extents are not part of the format; an item's extent becomes known only
//! when the next item's offset is read, so emission is deferred by one item.

use std::io::BufRead;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use super::InventoryItem;
use super::error::InventoryError;
use crate::utils::compile_static_regex;

/// Minimum number of colon-separated fields per line.
const MIN_FIELDS: usize = 7;

static DATE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^d=(\d{4})(\d{2})(\d{2})(\d{2})$"));

/// Parses a short inventory read from `reader`.
///
/// `total_length` is the size in bytes of the composite file the inventory
/// describes; it fixes the extent of the final item.
///
/// Records written as `N.M` with `M > 1` are folded into the preceding item,
/// appending their parameter name.
///
/// # Errors
///
/// Returns an [`InventoryError`] naming the first offending line.
///
/// # Example
///
/// ```
/// use aonui_core::parse_inventory;
///
/// let text = "1:0:d=2014110100:HGT:850 mb:6 hour fcst:\n\
///             2:200:d=2014110100:UGRD:850 mb:6 hour fcst:\n";
/// let inventory = parse_inventory(text.as_bytes(), 400).unwrap();
/// assert_eq!(inventory.len(), 2);
/// assert_eq!(inventory[1].offset, 200);
/// assert_eq!(inventory[1].extent, 200);
/// ```
pub fn parse_inventory<R: BufRead>(reader: R, total_length: u64) -> Result<Vec<InventoryItem>, InventoryError> {
    let mut inventory = Vec::new();
    let mut pending: Option<InventoryItem> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| InventoryError::Read { source })?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < MIN_FIELDS {
            return Err(InventoryError::TooFewFields {
                line: line_no,
                found: fields.len(),
            });
        }

        let (record_number, sub_record) = parse_record_id(fields[0], line_no)?;
        let offset: u64 = parse_number(fields[1], "offset", line_no)?;
        let timestamp = parse_date_field(fields[2], line_no)?;
        let field_average_count: u32 = if fields[6].is_empty() {
            0
        } else {
            parse_number(fields[6], "field average count", line_no)?
        };

        if sub_record > 1 {
            let Some(item) = pending.as_mut() else {
                return Err(InventoryError::UnexpectedSubrecord { line: line_no });
            };
            item.parameters.push(fields[3].to_string());
            continue;
        }

        let item = InventoryItem {
            record_number,
            offset,
            extent: 0,
            timestamp,
            parameters: vec![fields[3].to_string()],
            layer_name: fields[4].to_string(),
            type_name: fields[5].to_string(),
            field_average_count,
        };

        if let Some(mut previous) = pending.take() {
            previous.extent = offset
                .checked_sub(previous.offset)
                .ok_or(InventoryError::OffsetsNotIncreasing {
                    line: line_no,
                    offset,
                    previous: previous.offset,
                })?;
            inventory.push(previous);
        }

        pending = Some(item);
    }

    if let Some(mut last) = pending {
        last.extent = total_length
            .checked_sub(last.offset)
            .ok_or(InventoryError::LengthBeforeLastOffset {
                total_length,
                offset: last.offset,
            })?;
        inventory.push(last);
    }

    Ok(inventory)
}

/// Splits `N` or `N.M` into record and sub-record numbers (sub-record 1 when absent).
fn parse_record_id(value: &str, line: usize) -> Result<(u32, u32), InventoryError> {
    let invalid = || InventoryError::InvalidRecordNumber {
        line,
        value: value.to_string(),
    };

    let mut parts = value.split('.');
    let record = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let sub_record = match parts.next() {
        Some(s) => s.parse().ok().filter(|&n: &u32| n >= 1).ok_or_else(invalid)?,
        None => 1,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok((record, sub_record))
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str, line: usize) -> Result<T, InventoryError> {
    value.parse().map_err(|_| InventoryError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_date_field(value: &str, line: usize) -> Result<DateTime<Utc>, InventoryError> {
    let invalid = || InventoryError::InvalidDateField {
        line,
        value: value.to_string(),
    };

    let caps = DATE_FIELD.captures(value).ok_or_else(invalid)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (Some(year), Some(month), Some(day), Some(hour)) = (num(1), num(2), num(3), num(4)) else {
        return Err(invalid());
    };

    let year = i32::try_from(year).map_err(|_| invalid())?;
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .ok_or_else(invalid)
}
