//! Payload assembly: content record + static tokens → published payload.

use cardpress_core::error::PublishError;
use cardpress_core::payload::{DEFAULT_CACHE_TTL, DEFAULT_CTA_ACTION, PublishedPayload};
use cardpress_core::record::{ContentRecord, fields};
use cardpress_core::token::{self, TokenTable};

/// Text fields that go through static token resolution.
const TEMPLATED_FIELDS: [&str; 5] = [
    fields::HEADLINE,
    fields::BODY,
    fields::CTA_LABEL,
    fields::CTA_ACTION,
    fields::TERMS_TEXT,
];

/// Characters that would move an artifact out of its `<prefix>/<cardId>.json` slot.
const RESERVED_ID_CHARS: [char; 5] = ['/', '\\', '?', '#', '%'];

/// Build the published payload for a record.
///
/// `cardId` is the only required field and must be a single path segment. `image` is an asset reference and
/// is copied as is; every other text field is resolved once.
pub fn assemble(record: &ContentRecord, tokens: &TokenTable) -> Result<PublishedPayload, PublishError> {
    let card_id = record
        .card_id()
        .ok_or_else(|| PublishError::MissingRequiredField(fields::CARD_ID.to_string()))?;
    check_card_id(&card_id)?;

    let resolved = |name: &str| record.text(name).map(|text| token::resolve(&text, tokens));

    Ok(PublishedPayload {
        card_id,
        headline: resolved(fields::HEADLINE),
        body: resolved(fields::BODY),
        image: record.text(fields::IMAGE),
        cta_label: resolved(fields::CTA_LABEL),
        cta_action: resolved(fields::CTA_ACTION)
            .filter(|action| !action.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CTA_ACTION.to_string()),
        terms_text: resolved(fields::TERMS_TEXT),
        cache_ttl: record.cache_ttl().unwrap_or(DEFAULT_CACHE_TTL),
    })
}

fn check_card_id(card_id: &str) -> Result<(), PublishError> {
    if card_id
        .chars()
        .any(|c| RESERVED_ID_CHARS.contains(&c) || c.is_control())
    {
        return Err(PublishError::InvalidField {
            name: fields::CARD_ID.to_string(),
            reason: format!("'{card_id}' is not a single path segment"),
        });
    }
    Ok(())
}

/// Static tokens in the record's templated fields that the table cannot resolve.
pub fn unresolved_tokens(record: &ContentRecord, tokens: &TokenTable) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for name in TEMPLATED_FIELDS {
        let Some(text) = record.text(name) else {
            continue;
        };
        for token_name in token::unresolved_static_tokens(&text, tokens) {
            if !missing.contains(&token_name) {
                missing.push(token_name);
            }
        }
    }
    missing
}
