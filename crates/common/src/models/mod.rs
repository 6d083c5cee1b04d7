//! Data model for the pipeline documents

pub mod price_entry;
pub mod reference;
pub mod restaurant;
pub mod summary;

pub use price_entry::{
    Confidence, EntryOutcome, Flag, FlagKind, FlaggedEntry, PriceSet, RawPriceEntry, Rejection,
    RejectionReason, RejectionReport, SizeBucket, ValidatedPriceDocument, ValidatedPriceEntry,
};
pub use reference::{
    Blocklist, BlocklistDocument, CityList, CityReference, MinimumWage, MinimumWageTable,
};
pub use restaurant::{restaurant_key, RestaurantRecord};
pub use summary::{AggregateDocument, BucketStats, CitySummary, PriceBuckets, DATA_VERSION};
