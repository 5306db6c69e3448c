// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod consume;
pub mod daemon;
pub mod inspect;
pub mod produce;
pub mod status;
