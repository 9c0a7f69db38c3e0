// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! secretsync binary: run credential generators and render secret templates.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use secretsync_config::{
	LogFormat, LoggingConfig, LoggingConfigLayer, SecretsyncConfig, SecretsyncConfigLayer,
	TemplateConfigLayer,
};
use secretsync_generator::{Context, GeneratorKind, GeneratorRegistry, GithubGeneratorConfig};
use secretsync_kube::{InMemoryObjectClient, KubeObjectClient, ObjectClient};
use secretsync_template::{Delimiters, Renderer, TemplateScope, TemplateTarget};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod version;

/// secretsync - generate credentials and render them into secrets.
#[derive(Parser, Debug)]
#[command(name = "secretsync", about = "Secret generators and templates", version)]
struct Args {
	/// Config file (defaults to /etc/secretsync/config.toml)
	#[arg(long, global = true, env = "SECRETSYNC_CONFIG")]
	config: Option<PathBuf>,

	/// Left template delimiter
	#[arg(long, global = true)]
	template_left_delimiter: Option<String>,

	/// Right template delimiter
	#[arg(long, global = true)]
	template_right_delimiter: Option<String>,

	/// Log output format: text or json
	#[arg(long, global = true)]
	log_format: Option<LogFormat>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run a generator and print the generated fields as YAML
	Generate {
		/// Generator kind, e.g. GithubAccessToken
		#[arg(long)]
		kind: GeneratorKind,

		/// Generator spec (YAML or JSON)
		#[arg(long)]
		spec: PathBuf,

		/// Namespace the generator reads key material from
		#[arg(long, default_value = "default")]
		namespace: String,

		/// Read secrets from this YAML file instead of the cluster
		#[arg(long)]
		secrets: Option<PathBuf>,
	},

	/// Render templates against secret data and print the result as YAML
	Render {
		/// YAML map of template key to template source
		#[arg(long)]
		templates: PathBuf,

		/// YAML map of secret data available to templates
		#[arg(long)]
		data: PathBuf,

		/// Values or KeysAndValues
		#[arg(long, default_value = "Values")]
		scope: TemplateScope,

		/// Data, Annotations or Labels
		#[arg(long, default_value = "Data")]
		target: TemplateTarget,
	},

	/// Show version and build information
	Version,
}

impl Args {
	fn overrides(&self) -> SecretsyncConfigLayer {
		SecretsyncConfigLayer {
			template: Some(TemplateConfigLayer {
				left_delimiter: self.template_left_delimiter.clone(),
				right_delimiter: self.template_right_delimiter.clone(),
			}),
			generator: None,
			logging: Some(LoggingConfigLayer {
				level: None,
				format: self.log_format,
			}),
		}
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	// stdout carries command output, so logs go to stderr.
	match logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Text => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

fn github_config(config: &SecretsyncConfig) -> anyhow::Result<GithubGeneratorConfig> {
	Ok(GithubGeneratorConfig::default()
		.with_base_url(&config.generator.github_api_url)?
		.with_http_timeout(config.generator.http_timeout())
		.with_timeout(config.generator.timeout()))
}

async fn object_client(secrets: Option<PathBuf>) -> anyhow::Result<Box<dyn ObjectClient>> {
	Ok(match secrets {
		Some(path) => Box::new(InMemoryObjectClient::from_yaml_file(&path)?),
		None => Box::new(
			KubeObjectClient::try_default()
				.await
				.context("failed to connect to Kubernetes; pass --secrets to run offline")?,
		),
	})
}

/// Cancel `ctx` on Ctrl-C so in-flight backend calls stop promptly.
fn cancel_on_interrupt(ctx: &Context) {
	let token = ctx.cancellation_token().clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::warn!("interrupted, cancelling");
			token.cancel();
		}
	});
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let config = secretsync_config::load_config_with(args.config.clone(), args.overrides())?;
	init_tracing(&config.logging);

	match args.command {
		Command::Generate {
			kind,
			spec,
			namespace,
			secrets,
		} => {
			let registry = GeneratorRegistry::with_defaults(github_config(&config)?)?;
			let client = object_client(secrets).await?;
			let ctx = Context::new();
			cancel_on_interrupt(&ctx);

			let generated = commands::generate(
				&registry,
				kind,
				&ctx,
				&spec,
				client.as_ref(),
				&namespace,
			)
			.await?;
			print!("{}", commands::fields_yaml(&generated.fields)?);
		}
		Command::Render {
			templates,
			data,
			scope,
			target,
		} => {
			let delimiters = Delimiters::new(
				config.template.left_delimiter.as_str(),
				config.template.right_delimiter.as_str(),
			)?;
			let renderer = Renderer::new(delimiters)?;
			let projection = commands::render(&renderer, &templates, &data, scope, target)?;
			print!("{}", commands::projection_yaml(&projection)?);
		}
		// Printed before configuration is loaded.
		Command::Version => {}
	}

	Ok(())
}
