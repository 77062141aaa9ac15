//! Address and Mnemonic Validation
//!
//! Validates mnemonic phrases, wordlist languages and confidential addresses.

use bip39::{Language, Mnemonic};
use elements::Address;
use std::str::FromStr;

use crate::error::{IdentityError, IdentityResult};
use crate::types::Network;

/// Resolve a wordlist language name; `None` means English
pub fn parse_language(language: Option<&str>) -> IdentityResult<Language> {
    let Some(name) = language else {
        return Ok(Language::English);
    };

    let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    match normalized.as_str() {
        "english" | "en" => Ok(Language::English),
        "chinese_simplified" | "simplified_chinese" => Ok(Language::SimplifiedChinese),
        "chinese_traditional" | "traditional_chinese" => Ok(Language::TraditionalChinese),
        "czech" => Ok(Language::Czech),
        "french" => Ok(Language::French),
        "italian" => Ok(Language::Italian),
        "japanese" => Ok(Language::Japanese),
        "korean" => Ok(Language::Korean),
        "spanish" => Ok(Language::Spanish),
        _ => Err(IdentityError::unsupported_language(format!(
            "Unsupported mnemonic language: {}",
            name
        ))),
    }
}

/// Check if a mnemonic phrase is valid in the given language
pub fn is_valid_mnemonic(phrase: &str, language: Option<&str>) -> bool {
    match parse_language(language) {
        Ok(language) => Mnemonic::parse_in(language, phrase).is_ok(),
        Err(_) => false,
    }
}

/// Parse a confidential address and check it belongs to `network`
pub fn parse_confidential_address(address: &str, network: Network) -> IdentityResult<Address> {
    let parsed = Address::from_str(address.trim()).map_err(|e| {
        IdentityError::invalid_input(format!("Invalid address: {}", e))
    })?;

    if parsed.params != network.address_params() {
        return Err(IdentityError::invalid_input(format!(
            "Address is not a {} address",
            network
        )));
    }

    if !parsed.is_blinded() {
        return Err(IdentityError::invalid_input(
            "Address carries no blinding public key",
        ));
    }

    Ok(parsed)
}
