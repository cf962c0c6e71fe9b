mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	BiasField, Config, DomainTypeConfig, HEALTH_PATH, ITEM_BIAS_KEY, Pagination, Postgres,
	RankingParams, RankingType, RecsModel, Recommend, SearchIndex, Service, Storage, USER_BIAS_KEY,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.search.url", &cfg.storage.search.url),
		("storage.search.doc_type", &cfg.storage.search.doc_type),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.service.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "service.request_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.pagination.default_limit == 0 || cfg.pagination.max_limit == 0 {
		return Err(Error::Validation {
			message: "pagination limits must be greater than zero.".to_string(),
		});
	}
	if cfg.pagination.default_limit > cfg.pagination.max_limit {
		return Err(Error::Validation {
			message: "pagination.default_limit must not exceed pagination.max_limit.".to_string(),
		});
	}
	if cfg.pagination.default_page == 0 {
		return Err(Error::Validation {
			message: "pagination.default_page must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.max_items_per_user == 0 {
		return Err(Error::Validation {
			message: "recommend.max_items_per_user must be greater than zero.".to_string(),
		});
	}
	// Truncated lists keep `max_query_events - 1` ids, so one id must survive.
	if cfg.recommend.max_query_events < 2 {
		return Err(Error::Validation {
			message: "recommend.max_query_events must be at least 2.".to_string(),
		});
	}
	if cfg.domains.is_empty() {
		return Err(Error::Validation {
			message: "At least one [[domains]] entry is required.".to_string(),
		});
	}

	let mut paths = HashSet::new();

	for domain in &cfg.domains {
		validate_domain(domain)?;

		if !paths.insert(domain.path.as_str()) {
			return Err(Error::Validation {
				message: format!("Domain path {} is declared more than once.", domain.path),
			});
		}
	}

	Ok(())
}

fn validate_domain(domain: &DomainTypeConfig) -> Result<()> {
	if !domain.path.starts_with('/') || domain.path.len() < 2 {
		return Err(Error::Validation {
			message: format!("Domain path {:?} must start with '/' and name a route.", domain.path),
		});
	}
	if domain.path == HEALTH_PATH || domain.path.contains(['{', '}', '*', ':']) {
		return Err(Error::Validation {
			message: format!("Domain path {:?} is reserved or not a literal route.", domain.path),
		});
	}

	for (label, value) in [
		("relation_name", &domain.relation_name),
		("index_name", &domain.index_name),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Domain {} {label} must be non-empty.", domain.path),
			});
		}
	}

	if domain.event_names.is_empty() || domain.event_names.iter().any(|name| name.trim().is_empty())
	{
		return Err(Error::Validation {
			message: format!("Domain {} event_names must be non-empty strings.", domain.path),
		});
	}

	for (source, biases) in [("default_bias", &domain.default_bias), ("bias", &domain.bias)] {
		if let Some((key, _)) = biases.iter().find(|(_, value)| !value.is_finite()) {
			return Err(Error::Validation {
				message: format!("Domain {} {source}.{key} must be a finite number.", domain.path),
			});
		}
	}

	for field in &domain.fields {
		if field.config_bias_name.trim().is_empty() || field.field_name.trim().is_empty() {
			return Err(Error::Validation {
				message: format!(
					"Domain {} fields entries need config_bias_name and field_name.",
					domain.path
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for domain in &mut cfg.domains {
		domain.path = domain.path.trim().to_string();

		if domain.path.len() > 1 && domain.path.ends_with('/') {
			domain.path.pop();
		}

		domain.event_names.iter_mut().for_each(|name| *name = name.trim().to_string());
	}
}
