use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{AccountId, ListingId};
use crate::domains::listings::geo::GeoPoint;
use crate::domains::listings::query::FeedQuery;
use crate::kernel::StoreError;

pub const DEFAULT_CURRENCY: &str = "INR";

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Apartment,
    Villa,
    House,
    Land,
    Office,
    Shop,
}

impl PropertyType {
    pub const ALL: [PropertyType; 6] = [
        PropertyType::Apartment,
        PropertyType::Villa,
        PropertyType::House,
        PropertyType::Land,
        PropertyType::Office,
        PropertyType::Shop,
    ];
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::Apartment => write!(f, "Apartment"),
            PropertyType::Villa => write!(f, "Villa"),
            PropertyType::House => write!(f, "House"),
            PropertyType::Land => write!(f, "Land"),
            PropertyType::Office => write!(f, "Office"),
            PropertyType::Shop => write!(f, "Shop"),
        }
    }
}

/// Case-insensitive, so `villa` and `VILLA` both name `Villa`.
impl std::str::FromStr for PropertyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        PropertyType::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Invalid property type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
    #[serde(rename = "Under Offer")]
    UnderOffer,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Available => write!(f, "Available"),
            ListingStatus::Sold => write!(f, "Sold"),
            ListingStatus::UnderOffer => write!(f, "Under Offer"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(ListingStatus::Available),
            "sold" => Ok(ListingStatus::Sold),
            "under offer" => Ok(ListingStatus::UnderOffer),
            _ => Err(anyhow!("Invalid listing status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FurnishingStatus {
    Furnished,
    #[serde(rename = "Semi-Furnished")]
    SemiFurnished,
    #[default]
    Unfurnished,
}

impl std::fmt::Display for FurnishingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FurnishingStatus::Furnished => write!(f, "Furnished"),
            FurnishingStatus::SemiFurnished => write!(f, "Semi-Furnished"),
            FurnishingStatus::Unfurnished => write!(f, "Unfurnished"),
        }
    }
}

impl std::str::FromStr for FurnishingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "furnished" => Ok(FurnishingStatus::Furnished),
            "semi-furnished" => Ok(FurnishingStatus::SemiFurnished),
            "unfurnished" => Ok(FurnishingStatus::Unfurnished),
            _ => Err(anyhow!("Invalid furnishing status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    #[default]
    Sqft,
    Sqm,
}

impl std::fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaUnit::Sqft => write!(f, "sqft"),
            AreaUnit::Sqm => write!(f, "sqm"),
        }
    }
}

impl std::str::FromStr for AreaUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqft" => Ok(AreaUnit::Sqft),
            "sqm" => Ok(AreaUnit::Sqm),
            _ => Err(anyhow!("Invalid area unit: {}", s)),
        }
    }
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub coordinates: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub value: Decimal,
    pub currency: String,
    pub is_negotiable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub value: f64,
    pub unit: AreaUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    pub area: Option<Area>,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub furnishing_status: FurnishingStatus,
    pub possession_date: Option<NaiveDate>,
    pub floor: Option<i32>,
}

/// A property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    #[serde(rename = "isResaleProperty")]
    pub is_resale: bool,
    pub rera_id: Option<String>,
    pub location: Location,
    pub price: Price,
    pub details: Details,
    /// Hosted image URLs; the first one is the thumbnail.
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub owner_id: AccountId,
    pub status: ListingStatus,
    pub is_verified: bool,
    pub view_count: i64,
    pub favorites_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Publicly visible facts about a listing's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

/// A listing joined to its owner, as loaded by the stores.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingWithOwner {
    pub listing: Listing,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_contact_number: String,
}

/// Outward representation of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSummary>,
}

impl ListingView {
    pub fn bare(listing: Listing) -> Self {
        Self {
            thumbnail: listing.thumbnail().map(str::to_string),
            listing,
            owner: None,
        }
    }

    /// Feed entries show who listed the property, without contact details.
    pub fn with_owner_name(row: ListingWithOwner) -> Self {
        let owner = OwnerSummary {
            id: row.listing.owner_id,
            first_name: row.owner_first_name,
            last_name: row.owner_last_name,
            contact_number: None,
        };
        Self {
            owner: Some(owner),
            ..Self::bare(row.listing)
        }
    }

    /// The detail page also exposes the owner's contact number.
    pub fn with_owner_contact(row: ListingWithOwner) -> Self {
        let owner = OwnerSummary {
            id: row.listing.owner_id,
            first_name: row.owner_first_name,
            last_name: row.owner_last_name,
            contact_number: Some(row.owner_contact_number),
        };
        Self {
            owner: Some(owner),
            ..Self::bare(row.listing)
        }
    }
}

/// Validated input for a new listing.
#[derive(Debug, Clone, TypedBuilder)]
pub struct NewListing {
    #[builder(default = ListingId::new())]
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub is_resale: bool,
    #[builder(default)]
    pub rera_id: Option<String>,
    pub location: Location,
    pub price: Price,
    pub details: Details,
    pub images: Vec<String>,
    #[builder(default)]
    pub amenities: Vec<String>,
    pub owner_id: AccountId,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl NewListing {
    /// The listing as it exists right after insert.
    pub fn into_listing(self) -> Listing {
        Listing {
            id: self.id,
            title: self.title,
            description: self.description,
            property_type: self.property_type,
            is_resale: self.is_resale,
            rera_id: self.rera_id,
            location: self.location,
            price: self.price,
            details: self.details,
            images: self.images,
            amenities: self.amenities,
            owner_id: self.owner_id,
            status: ListingStatus::Available,
            is_verified: false,
            view_count: 0,
            favorites_count: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Owner edits. Only these fields may change after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub details: Option<Details>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<ListingStatus>,
}

impl ListingChanges {
    pub fn is_empty(&self) -> bool {
        *self == ListingChanges::default()
    }

    pub fn apply_to(self, listing: &mut Listing) {
        if let Some(title) = self.title {
            listing.title = title;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(details) = self.details {
            listing.details = details;
        }
        if let Some(amenities) = self.amenities {
            listing.amenities = amenities;
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
    }
}

// ============================================================================
// SQL persistence
// ============================================================================

#[derive(sqlx::FromRow, Debug)]
pub(crate) struct ListingRow {
    id: ListingId,
    title: String,
    description: String,
    property_type: String,
    is_resale: bool,
    rera_id: Option<String>,
    address: String,
    city: String,
    state: String,
    pincode: String,
    latitude: f64,
    longitude: f64,
    price_value: Decimal,
    currency: String,
    is_negotiable: bool,
    area_value: Option<f64>,
    area_unit: String,
    bedrooms: i32,
    bathrooms: i32,
    furnishing_status: String,
    possession_date: Option<NaiveDate>,
    floor: Option<i32>,
    images: Vec<String>,
    amenities: Vec<String>,
    owner_id: AccountId,
    status: String,
    is_verified: bool,
    view_count: i64,
    favorites_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug)]
struct ListingWithOwnerRow {
    #[sqlx(flatten)]
    listing: ListingRow,
    owner_first_name: String,
    owner_last_name: String,
    owner_contact_number: String,
}

impl TryFrom<ListingRow> for Listing {
    type Error = StoreError;

    fn try_from(row: ListingRow) -> std::result::Result<Self, Self::Error> {
        let area_unit: AreaUnit = row.area_unit.parse()?;
        Ok(Listing {
            id: row.id,
            title: row.title,
            description: row.description,
            property_type: row.property_type.parse()?,
            is_resale: row.is_resale,
            rera_id: row.rera_id,
            location: Location {
                address: row.address,
                city: row.city,
                state: row.state,
                pincode: row.pincode,
                coordinates: GeoPoint {
                    lat: row.latitude,
                    lng: row.longitude,
                },
            },
            price: Price {
                value: row.price_value,
                currency: row.currency,
                is_negotiable: row.is_negotiable,
            },
            details: Details {
                area: row.area_value.map(|value| Area {
                    value,
                    unit: area_unit,
                }),
                bedrooms: row.bedrooms,
                bathrooms: row.bathrooms,
                furnishing_status: row.furnishing_status.parse()?,
                possession_date: row.possession_date,
                floor: row.floor,
            },
            images: row.images,
            amenities: row.amenities,
            owner_id: row.owner_id,
            status: row.status.parse()?,
            is_verified: row.is_verified,
            view_count: row.view_count,
            favorites_count: row.favorites_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ListingWithOwnerRow> for ListingWithOwner {
    type Error = StoreError;

    fn try_from(row: ListingWithOwnerRow) -> std::result::Result<Self, Self::Error> {
        Ok(ListingWithOwner {
            listing: row.listing.try_into()?,
            owner_first_name: row.owner_first_name,
            owner_last_name: row.owner_last_name,
            owner_contact_number: row.owner_contact_number,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> std::result::Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const WITH_OWNER: &str = "SELECT l.*,
        o.first_name AS owner_first_name,
        o.last_name AS owner_last_name,
        o.contact_number AS owner_contact_number
    FROM listings l
    JOIN accounts o ON o.id = l.owner_id";

/// Feed predicate. Every parameter may be NULL to disable its clause except
/// the status in `$1`.
const FEED_FILTER: &str = "l.status = $1
      AND ($2::text IS NULL
           OR strpos(lower(l.title), lower($2)) > 0
           OR strpos(lower(l.description), lower($2)) > 0)
      AND ($3::text IS NULL OR lower(l.city) = lower($3))
      AND ($4::text IS NULL OR l.property_type = $4)
      AND ($5::numeric IS NULL OR l.price_value >= $5)
      AND ($6::numeric IS NULL OR l.price_value <= $6)
      AND ($7::int4 IS NULL OR l.bedrooms >= $7)
      AND ($8::float8 IS NULL
           OR central_angle($8::float8, $9::float8, l.latitude, l.longitude) <= $10::float8)";

impl Listing {
    pub async fn insert(new: &NewListing, pool: &PgPool) -> std::result::Result<Self, StoreError> {
        let row = sqlx::query_as::<_, ListingRow>(
            "INSERT INTO listings (
                id, title, description, property_type, is_resale, rera_id,
                address, city, state, pincode, latitude, longitude,
                price_value, currency, is_negotiable,
                area_value, area_unit, bedrooms, bathrooms, furnishing_status,
                possession_date, floor, images, amenities, owner_id,
                created_at, updated_at
             )
             VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11, $12,
                $13, $14, $15,
                $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25,
                $26, $26
             )
             RETURNING *",
        )
        .bind(new.id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.property_type.to_string())
        .bind(new.is_resale)
        .bind(&new.rera_id)
        .bind(&new.location.address)
        .bind(&new.location.city)
        .bind(&new.location.state)
        .bind(&new.location.pincode)
        .bind(new.location.coordinates.lat)
        .bind(new.location.coordinates.lng)
        .bind(new.price.value)
        .bind(&new.price.currency)
        .bind(new.price.is_negotiable)
        .bind(new.details.area.map(|a| a.value))
        .bind(new.details.area.map(|a| a.unit).unwrap_or_default().to_string())
        .bind(new.details.bedrooms)
        .bind(new.details.bathrooms)
        .bind(new.details.furnishing_status.to_string())
        .bind(new.details.possession_date)
        .bind(new.details.floor)
        .bind(&new.images)
        .bind(&new.amenities)
        .bind(new.owner_id)
        .bind(new.created_at)
        .fetch_one(pool)
        .await?;

        row.try_into()
    }

    pub async fn find_by_id(
        id: ListingId,
        pool: &PgPool,
    ) -> std::result::Result<Option<Self>, StoreError> {
        let row = sqlx::query_as::<_, ListingRow>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(Listing::try_from).transpose()
    }

    /// Increment the view counter and return the listing with its owner, in
    /// one statement.
    pub async fn record_view(
        id: ListingId,
        pool: &PgPool,
    ) -> std::result::Result<Option<ListingWithOwner>, StoreError> {
        let row = sqlx::query_as::<_, ListingWithOwnerRow>(
            "WITH l AS (
                UPDATE listings SET view_count = view_count + 1
                WHERE id = $1
                RETURNING *
             )
             SELECT l.*,
                    o.first_name AS owner_first_name,
                    o.last_name AS owner_last_name,
                    o.contact_number AS owner_contact_number
             FROM l
             JOIN accounts o ON o.id = l.owner_id",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        row.map(ListingWithOwner::try_from).transpose()
    }

    /// One page of the feed plus the total number of matches.
    pub async fn search(
        query: &FeedQuery,
        pool: &PgPool,
    ) -> std::result::Result<(Vec<ListingWithOwner>, i64), StoreError> {
        let near = query.near.as_ref();
        let sql = format!(
            "{} WHERE {} ORDER BY {} {}, l.id ASC LIMIT $11 OFFSET $12",
            WITH_OWNER,
            FEED_FILTER,
            query.sort.field.column(),
            query.sort.order.keyword(),
        );

        let rows = sqlx::query_as::<_, ListingWithOwnerRow>(&sql)
            .bind(query.status.to_string())
            .bind(&query.search)
            .bind(&query.city)
            .bind(query.property_type.map(|t| t.to_string()))
            .bind(query.min_price)
            .bind(query.max_price)
            .bind(query.min_bedrooms)
            .bind(near.map(|n| n.center.lat))
            .bind(near.map(|n| n.center.lng))
            .bind(near.map(|n| n.angular_radius()))
            .bind(query.page.limit() as i64)
            .bind(query.page.offset())
            .fetch_all(pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM listings l WHERE {}",
            FEED_FILTER
        ))
        .bind(query.status.to_string())
        .bind(&query.search)
        .bind(&query.city)
        .bind(query.property_type.map(|t| t.to_string()))
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(query.min_bedrooms)
        .bind(near.map(|n| n.center.lat))
        .bind(near.map(|n| n.center.lng))
        .bind(near.map(|n| n.angular_radius()))
        .fetch_one(pool)
        .await?;

        Ok((collect(rows)?, total))
    }

    /// All listings owned by an account, newest first.
    pub async fn find_by_owner(
        owner_id: AccountId,
        pool: &PgPool,
    ) -> std::result::Result<Vec<Self>, StoreError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            "SELECT * FROM listings WHERE owner_id = $1 ORDER BY created_at DESC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        collect(rows)
    }

    /// Apply `changes` in place. Absent fields keep their stored value and
    /// counters are never written.
    pub async fn update(
        id: ListingId,
        changes: &ListingChanges,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> std::result::Result<Option<Self>, StoreError> {
        let price = changes.price.as_ref();
        let details = changes.details.as_ref();
        let row = sqlx::query_as::<_, ListingRow>(
            "UPDATE listings
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 price_value = CASE WHEN $4 THEN $5 ELSE price_value END,
                 currency = CASE WHEN $4 THEN $6 ELSE currency END,
                 is_negotiable = CASE WHEN $4 THEN $7 ELSE is_negotiable END,
                 area_value = CASE WHEN $8 THEN $9 ELSE area_value END,
                 area_unit = CASE WHEN $8 THEN $10 ELSE area_unit END,
                 bedrooms = CASE WHEN $8 THEN $11 ELSE bedrooms END,
                 bathrooms = CASE WHEN $8 THEN $12 ELSE bathrooms END,
                 furnishing_status = CASE WHEN $8 THEN $13 ELSE furnishing_status END,
                 possession_date = CASE WHEN $8 THEN $14 ELSE possession_date END,
                 floor = CASE WHEN $8 THEN $15 ELSE floor END,
                 amenities = COALESCE($16, amenities),
                 status = COALESCE($17, status),
                 updated_at = $18
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(price.is_some())
        .bind(price.map(|p| p.value))
        .bind(price.map(|p| p.currency.clone()))
        .bind(price.map(|p| p.is_negotiable))
        .bind(details.is_some())
        .bind(details.and_then(|d| d.area).map(|a| a.value))
        .bind(
            details
                .map(|d| d.area.map(|a| a.unit).unwrap_or_default().to_string()),
        )
        .bind(details.map(|d| d.bedrooms))
        .bind(details.map(|d| d.bathrooms))
        .bind(details.map(|d| d.furnishing_status.to_string()))
        .bind(details.and_then(|d| d.possession_date))
        .bind(details.and_then(|d| d.floor))
        .bind(&changes.amenities)
        .bind(changes.status.map(|s| s.to_string()))
        .bind(now)
        .fetch_optional(pool)
        .await?;
        row.map(Listing::try_from).transpose()
    }

    pub async fn delete(id: ListingId, pool: &PgPool) -> std::result::Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_owner(
        owner_id: AccountId,
        pool: &PgPool,
    ) -> std::result::Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE owner_id = $1")
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
