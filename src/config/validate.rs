// src/config/validate.rs

use crate::config::model::{ConfigFile, OutputSection, RawConfigFile, WaitSection};
use crate::errors::{ProcessError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProcessError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_output(&raw.output)?;
        validate_wait(&raw.wait)?;
        Ok(ConfigFile::new_unchecked(raw.output, raw.launch, raw.wait))
    }
}

fn validate_output(output: &OutputSection) -> Result<()> {
    for (name, value) in [
        ("initial_capacity", output.initial_capacity),
        ("max_size", output.max_size),
        ("chunk_size", output.chunk_size),
        ("async_max_read", output.async_max_read),
    ] {
        if value == 0 {
            return Err(ProcessError::Config(format!(
                "[output].{name} must be >= 1 (got 0)"
            )));
        }
    }

    if output.initial_capacity > output.max_size {
        return Err(ProcessError::Config(format!(
            "[output].initial_capacity ({}) must not exceed max_size ({})",
            output.initial_capacity, output.max_size
        )));
    }

    if output.chunk_size > output.max_size {
        return Err(ProcessError::Config(format!(
            "[output].chunk_size ({}) must not exceed max_size ({})",
            output.chunk_size, output.max_size
        )));
    }

    Ok(())
}

fn validate_wait(wait: &WaitSection) -> Result<()> {
    if wait.poll_interval_ms == 0 {
        return Err(ProcessError::Config(
            "[wait].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
