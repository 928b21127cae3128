//! Feed query: raw query-string parameters in, a validated filter out.
//!
//! Both stores consume the same [`FeedQuery`]. Postgres compiles it into the
//! `FEED_FILTER` clause; the in-memory store evaluates [`FeedQuery::matches`]
//! and [`FeedQuery::compare`] directly.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::geo::{GeoPoint, GeoRadius};
use super::models::{Listing, ListingStatus, PropertyType};
use crate::common::{AppError, PageRequest};

/// Untrusted feed parameters exactly as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub bedrooms: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    ViewCount,
    Bedrooms,
    Area,
}

impl SortField {
    /// Column the field sorts on. Only these literals ever reach the ORDER BY.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "l.created_at",
            SortField::Price => "l.price_value",
            SortField::ViewCount => "l.view_count",
            SortField::Bedrooms => "l.bedrooms",
            SortField::Area => "l.area_value",
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "price" => Ok(SortField::Price),
            "viewCount" => Ok(SortField::ViewCount),
            "bedrooms" => Ok(SortField::Bedrooms),
            "area" => Ok(SortField::Area),
            _ => Err(AppError::validation(format!(
                "sortBy must be one of createdAt, price, viewCount, bedrooms, area (got {})",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::validation("order must be asc or desc")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedSort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Validated feed filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_bedrooms: Option<i32>,
    pub status: ListingStatus,
    pub near: Option<GeoRadius>,
    pub page: PageRequest,
    pub sort: FeedSort,
}

fn parse_field<T: FromStr>(value: Option<String>, field: &str) -> Result<Option<T>, AppError> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::validation(format!("{} has an invalid value: {}", field, v))),
    }
}

impl FeedParams {
    pub fn validate(self) -> Result<FeedQuery, AppError> {
        let page = parse_field::<i64>(self.page, "page")?;
        let limit = parse_field::<i64>(self.limit, "limit")?;

        let lat = parse_field::<f64>(self.lat, "lat")?;
        let lng = parse_field::<f64>(self.lng, "lng")?;
        let radius = parse_field::<f64>(self.radius, "radius")?;

        // Only a complete triple filters; a partial one is ignored.
        let near = match (lat, lng, radius) {
            (Some(lat), Some(lng), Some(radius_km)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(AppError::validation("lat must be between -90 and 90"));
                }
                if !(-180.0..=180.0).contains(&lng) {
                    return Err(AppError::validation("lng must be between -180 and 180"));
                }
                if !radius_km.is_finite() || radius_km <= 0.0 {
                    return Err(AppError::validation("radius must be a positive number"));
                }
                Some(GeoRadius {
                    center: GeoPoint { lat, lng },
                    radius_km,
                })
            }
            _ => None,
        };

        Ok(FeedQuery {
            search: crate::common::validation::non_blank(self.search),
            city: crate::common::validation::non_blank(self.city),
            property_type: parse_field(self.property_type, "propertyType")?,
            min_price: parse_field(self.min_price, "minPrice")?,
            max_price: parse_field(self.max_price, "maxPrice")?,
            min_bedrooms: parse_field(self.bedrooms, "bedrooms")?,
            status: parse_field(self.status, "status")?.unwrap_or_default(),
            near,
            page: PageRequest::clamped(page, limit),
            sort: FeedSort {
                field: parse_field(self.sort_by, "sortBy")?.unwrap_or_default(),
                order: parse_field(self.order, "order")?.unwrap_or_default(),
            },
        })
    }
}

impl FeedQuery {
    /// Evaluate the filter against one listing.
    pub fn matches(&self, listing: &Listing) -> bool {
        if listing.status != self.status {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !listing.title.to_lowercase().contains(&needle)
                && !listing.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if listing.location.city.to_lowercase() != city.to_lowercase() {
                return false;
            }
        }
        if let Some(property_type) = self.property_type {
            if listing.property_type != property_type {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if listing.price.value < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price.value > max {
                return false;
            }
        }
        if let Some(min_bedrooms) = self.min_bedrooms {
            if listing.details.bedrooms < min_bedrooms {
                return false;
            }
        }
        if let Some(near) = &self.near {
            if !near.contains(listing.location.coordinates) {
                return false;
            }
        }
        true
    }

    /// Feed ordering: the requested field and direction, then id ascending.
    ///
    /// Missing areas sort as larger than any value, the way Postgres orders
    /// NULLs.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self.sort.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Price => a.price.value.cmp(&b.price.value),
            SortField::ViewCount => a.view_count.cmp(&b.view_count),
            SortField::Bedrooms => a.details.bedrooms.cmp(&b.details.bedrooms),
            SortField::Area => {
                match (
                    a.details.area.map(|x| x.value),
                    b.details.area.map(|x| x.value),
                ) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };
        let primary = match self.sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
