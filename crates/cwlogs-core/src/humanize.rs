// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Human-readable sizes for the run summary.

use crate::stats::RunStatistics;

const SI_BASE: u64 = 1000;
const SI_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// SI size with one decimal below 10 units: `1.2 MB`, `83 MB`, `999 B`.
pub fn bytes(size: u64) -> String {
    if size < 10 {
        return format!("{size} B");
    }

    let mut exponent = 0;
    let mut scale = 1u64;
    while exponent + 1 < SI_UNITS.len() && size / scale >= SI_BASE {
        scale *= SI_BASE;
        exponent += 1;
    }

    let value = ((size as f64 / scale as f64) * 10.0 + 0.5).floor() / 10.0;
    let unit = SI_UNITS[exponent];
    if value < 10.0 {
        format!("{value:.1} {unit}")
    } else {
        format!("{value:.0} {unit}")
    }
}

/// Thousands separators: `1,234,567`.
pub fn comma(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn summary_line(stats: &RunStatistics) -> String {
    format!(
        "FileCount: {}, TotalSize: {} ({})",
        stats.file_count,
        bytes(stats.total_bytes),
        comma(stats.total_bytes)
    )
}
