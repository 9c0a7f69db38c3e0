// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod generator;
mod logging;
mod template;

pub use generator::{GeneratorConfig, GeneratorConfigLayer, DEFAULT_GITHUB_API_URL};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use template::{
	TemplateConfig, TemplateConfigLayer, DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER,
};
