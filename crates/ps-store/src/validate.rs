//! Input checks run before anything is submitted.

use chrono::NaiveDate;
use ps_api_types::{Address, DonationFormData, NewPuppyInfo};
use ps_chain_client::U256;
use ps_chain_client::units::parse_amount;
use url::Url;

use crate::OpError;

/// Absolute `http`/`https` URL with a host part.
pub fn is_image_url_str(url: &str) -> bool {
    let url = url.trim();
    if url.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// `YYYY-MM-DD` or `YYYY/MM/DD` naming a real calendar day.
pub fn is_valid_date_str(date: &str) -> bool {
    let normalized = date.trim().replacen('/', "-", 2);
    let well_shaped = normalized.len() == 10
        && normalized
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    well_shaped && NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").is_ok()
}

/// Returns the value to send, in smallest units.
pub fn donation_value(form: &DonationFormData, minimum: U256) -> Result<U256, OpError> {
    if form.amount.trim().is_empty() || form.keyword.trim().is_empty() || form.message.trim().is_empty()
    {
        return Err(OpError::Validation(
            "amount, keyword and message are required".to_owned(),
        ));
    }

    let value = parse_amount(&form.amount).map_err(|err| OpError::Validation(err.to_string()))?;
    if value < minimum {
        return Err(OpError::Validation(format!(
            "donation of {} is below the minimum",
            form.amount.trim()
        )));
    }
    Ok(value)
}

pub fn new_puppy(info: &NewPuppyInfo) -> Result<(), OpError> {
    if info.name.trim().is_empty() {
        return Err(OpError::Validation("puppy name is required".to_owned()));
    }
    if !is_image_url_str(&info.image_url) {
        return Err(OpError::Validation(format!(
            "'{}' is not an image URL",
            info.image_url
        )));
    }
    if !is_valid_date_str(&info.birthday) {
        return Err(OpError::Validation(format!(
            "'{}' is not a valid birthday",
            info.birthday
        )));
    }
    Ok(())
}

pub fn address(raw: &str) -> Result<Address, OpError> {
    let address = Address::new(raw);
    if !address.is_well_formed() {
        return Err(OpError::Validation(format!("'{raw}' is not an address")));
    }
    Ok(address)
}

pub fn token_amount(raw: &str) -> Result<U256, OpError> {
    let amount = parse_amount(raw).map_err(|err| OpError::Validation(err.to_string()))?;
    if amount.is_zero() {
        return Err(OpError::Validation("amount must be greater than zero".to_owned()));
    }
    Ok(amount)
}
