//! Client-supplied listing fields and their validation.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::listing::{
    Area, AreaUnit, Details, FurnishingStatus, ListingChanges, ListingStatus, Location, Price,
    PropertyType, DEFAULT_CURRENCY,
};
use crate::common::validation::{max_len, non_blank, required};
use crate::common::AppError;
use crate::domains::listings::geo::GeoPoint;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_IMAGES: usize = 10;

/// Decode a JSON-encoded form field.
pub fn parse_json_field<T: DeserializeOwned>(raw: &str, field: &str) -> Result<T, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::validation(format!("{} must be valid JSON: {}", field, e)))
}

fn parse_enum<T: std::str::FromStr>(value: Option<String>, field: &str) -> Result<Option<T>, AppError> {
    match non_blank(value) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::validation(format!("{} has an invalid value: {}", field, v))),
    }
}

pub fn validate_title(title: Option<String>) -> Result<String, AppError> {
    let title = required(title, "title")?;
    max_len(&title, MAX_TITLE_LEN, "title")?;
    Ok(title)
}

pub fn validate_description(description: Option<String>) -> Result<String, AppError> {
    let description = required(description, "description")?;
    max_len(&description, MAX_DESCRIPTION_LEN, "description")?;
    Ok(description)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInput {
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub is_negotiable: Option<bool>,
}

impl PriceInput {
    pub fn validate(self) -> Result<Price, AppError> {
        let value = self
            .value
            .ok_or_else(|| AppError::validation("price.value is required"))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AppError::validation("price.value must not be negative"));
        }
        Ok(Price {
            value,
            currency: non_blank(self.currency)
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            is_negotiable: self.is_negotiable.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

impl LocationInput {
    pub fn validate(self) -> Result<Location, AppError> {
        let coordinates = self
            .coordinates
            .ok_or_else(|| AppError::validation("location.coordinates is required"))?;
        if !coordinates.is_valid() {
            return Err(AppError::validation(
                "location.coordinates must have lat in [-90, 90] and lng in [-180, 180]",
            ));
        }
        Ok(Location {
            address: required(self.address, "location.address")?,
            city: required(self.city, "location.city")?,
            state: required(self.state, "location.state")?,
            pincode: required(self.pincode, "location.pincode")?,
            coordinates,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInput {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsInput {
    pub area: Option<AreaInput>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub furnishing_status: Option<String>,
    /// `YYYY-MM-DD` or a full RFC 3339 timestamp.
    pub possession_date: Option<String>,
    pub floor: Option<i32>,
}

fn parse_possession_date(raw: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| AppError::validation("details.possessionDate must be a date"))
}

impl DetailsInput {
    pub fn validate(self) -> Result<Details, AppError> {
        let bedrooms = self
            .bedrooms
            .ok_or_else(|| AppError::validation("details.bedrooms is required"))?;
        let bathrooms = self
            .bathrooms
            .ok_or_else(|| AppError::validation("details.bathrooms is required"))?;
        if bedrooms < 0 || bathrooms < 0 {
            return Err(AppError::validation(
                "details.bedrooms and details.bathrooms must not be negative",
            ));
        }

        let area = match self.area {
            Some(AreaInput {
                value: Some(value),
                unit,
            }) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(AppError::validation("details.area.value must not be negative"));
                }
                Some(Area {
                    value,
                    unit: parse_enum::<AreaUnit>(unit, "details.area.unit")?.unwrap_or_default(),
                })
            }
            _ => None,
        };

        Ok(Details {
            area,
            bedrooms,
            bathrooms,
            furnishing_status: parse_enum::<FurnishingStatus>(
                self.furnishing_status,
                "details.furnishingStatus",
            )?
            .unwrap_or_default(),
            possession_date: parse_possession_date(self.possession_date)?,
            floor: self.floor,
        })
    }
}

/// Text parts of the create-listing form. The JSON-valued fields arrive as
/// raw strings and are decoded during validation.
#[derive(Debug, Clone, Default)]
pub struct ListingSubmission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<String>,
    pub is_resale: Option<String>,
    pub rera_id: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    pub details: Option<String>,
    pub amenities: Option<String>,
}

/// Submission fields after validation, before images are uploaded.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub is_resale: bool,
    pub rera_id: Option<String>,
    pub price: Price,
    pub location: Location,
    pub details: Details,
    pub amenities: Vec<String>,
}

fn clean_amenities(amenities: Vec<String>) -> Vec<String> {
    amenities
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

impl ListingSubmission {
    pub fn validate(self) -> Result<ValidatedSubmission, AppError> {
        let title = validate_title(self.title)?;
        let description = validate_description(self.description)?;
        let property_type = parse_enum::<PropertyType>(self.property_type, "propertyType")?
            .ok_or_else(|| AppError::validation("propertyType is required"))?;
        let is_resale = match required(self.is_resale, "isResaleProperty")?
            .to_ascii_lowercase()
            .as_str()
        {
            "true" => true,
            "false" => false,
            _ => return Err(AppError::validation("isResaleProperty must be true or false")),
        };

        let price: PriceInput = parse_json_field(&required(self.price, "price")?, "price")?;
        let location: LocationInput =
            parse_json_field(&required(self.location, "location")?, "location")?;
        let details: DetailsInput =
            parse_json_field(&required(self.details, "details")?, "details")?;
        let amenities: Vec<String> = match non_blank(self.amenities) {
            Some(raw) => parse_json_field(&raw, "amenities")?,
            None => Vec::new(),
        };

        Ok(ValidatedSubmission {
            title,
            description,
            property_type,
            is_resale,
            rera_id: non_blank(self.rera_id).map(|r| r.to_uppercase()),
            price: price.validate()?,
            location: location.validate()?,
            details: details.validate()?,
            amenities: clean_amenities(amenities),
        })
    }
}

/// JSON body of a listing update. Fields outside the whitelist are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub details: Option<DetailsInput>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<String>,
}

impl ListingUpdate {
    pub fn validate(self) -> Result<ListingChanges, AppError> {
        Ok(ListingChanges {
            title: self.title.map(|t| validate_title(Some(t))).transpose()?,
            description: self
                .description
                .map(|d| validate_description(Some(d)))
                .transpose()?,
            price: self.price.map(PriceInput::validate).transpose()?,
            details: self.details.map(DetailsInput::validate).transpose()?,
            amenities: self.amenities.map(clean_amenities),
            status: match self.status {
                Some(s) => Some(
                    parse_enum::<ListingStatus>(Some(s), "status")?
                        .ok_or_else(|| AppError::validation("status must not be blank"))?,
                ),
                None => None,
            },
        })
    }
}
