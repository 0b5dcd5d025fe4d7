// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Tracing subscriber setup for hosts that don't install their own

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "parafont=info";

/// Install a formatting subscriber filtered by `RUST_LOG`.
///
/// Falls back to `parafont=info` when `RUST_LOG` is unset or invalid. A
/// second call, or a host that already installed a subscriber, is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::debug!("[logging] subscriber installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
    }
}
