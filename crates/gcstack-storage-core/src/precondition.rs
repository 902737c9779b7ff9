//! Optimistic-concurrency precondition evaluation.
//!
//! Every check compares a current value `V` with an optional `match` and an
//! optional `notMatch`:
//!
//! - fails if `notMatch` is present and equals `V`
//! - fails if `match` is present and differs from `V`
//!
//! A missing object compares as generation `0` and metageneration `0` at
//! every call site, so `ifGenerationMatch=0` reads "only if nothing is
//! live".
//!
//! ```
//! use gcstack_storage_core::precondition::check_value;
//!
//! assert!(check_value("ifGenerationMatch", 0, Some(0), None).is_ok());
//! assert!(check_value("ifGenerationMatch", 7, Some(0), None).is_err());
//! assert!(check_value("ifGenerationNotMatch", 7, None, Some(7)).is_err());
//! ```

use gcstack_storage_model::{BucketPreconditions, Object, Preconditions, SourcePreconditions};

use crate::error::{StorageError, StorageResult};
use crate::utils::{is_valid_if_match, is_valid_if_none_match};

/// Compare `current` against a match / not-match pair.
///
/// # Errors
///
/// Returns [`StorageError::PreconditionFailed`] naming `field` when either
/// condition does not hold.
pub fn check_value(
    field: &str,
    current: i64,
    matches: Option<i64>,
    not_matches: Option<i64>,
) -> StorageResult<()> {
    if let Some(expected) = not_matches {
        if expected == current {
            return Err(StorageError::precondition(format!(
                "{field}: value is {current}"
            )));
        }
    }
    if let Some(expected) = matches {
        if expected != current {
            return Err(StorageError::precondition(format!(
                "{field}: expected {expected}, actual {current}"
            )));
        }
    }
    Ok(())
}

/// Evaluate target-object preconditions against `current` (`None` when no
/// object exists).
///
/// # Errors
///
/// Returns [`StorageError::PreconditionFailed`] for the first condition
/// that does not hold.
pub fn check_object(preconditions: &Preconditions, current: Option<&Object>) -> StorageResult<()> {
    let generation = current.map_or(0, |o| o.generation);
    let metageneration = current.map_or(0, |o| o.metageneration);

    check_value(
        "ifGenerationMatch",
        generation,
        preconditions.if_generation_match,
        None,
    )?;
    check_value(
        "ifGenerationNotMatch",
        generation,
        None,
        preconditions.if_generation_not_match,
    )?;
    check_value(
        "ifMetagenerationMatch",
        metageneration,
        preconditions.if_metageneration_match,
        None,
    )?;
    check_value(
        "ifMetagenerationNotMatch",
        metageneration,
        None,
        preconditions.if_metageneration_not_match,
    )?;

    if let Some(if_match) = &preconditions.if_etag_match {
        let ok = current.is_some_and(|o| is_valid_if_match(&o.etag, if_match));
        if !ok {
            return Err(StorageError::precondition(format!("If-Match: {if_match}")));
        }
    }
    if let Some(if_none_match) = &preconditions.if_etag_not_match {
        let ok = current.is_none_or(|o| is_valid_if_none_match(&o.etag, if_none_match));
        if !ok {
            return Err(StorageError::precondition(format!(
                "If-None-Match: {if_none_match}"
            )));
        }
    }
    Ok(())
}

/// Evaluate source preconditions of a copy, rewrite or compose.
///
/// # Errors
///
/// Returns [`StorageError::PreconditionFailed`] for the first condition
/// that does not hold.
pub fn check_source(preconditions: &SourcePreconditions, source: &Object) -> StorageResult<()> {
    check_value(
        "ifSourceGenerationMatch",
        source.generation,
        preconditions.if_source_generation_match,
        preconditions.if_source_generation_not_match,
    )?;
    check_value(
        "ifSourceMetagenerationMatch",
        source.metageneration,
        preconditions.if_source_metageneration_match,
        preconditions.if_source_metageneration_not_match,
    )
}

/// Evaluate bucket metageneration preconditions.
///
/// # Errors
///
/// Returns [`StorageError::PreconditionFailed`] when a condition does not
/// hold.
pub fn check_bucket(preconditions: &BucketPreconditions, metageneration: i64) -> StorageResult<()> {
    check_value(
        "ifMetagenerationMatch",
        metageneration,
        preconditions.if_metageneration_match,
        preconditions.if_metageneration_not_match,
    )
}
