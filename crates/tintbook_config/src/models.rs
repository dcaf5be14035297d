// --- File: crates/tintbook_config/src/models.rs ---

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g., sqlite://data/tintbook.db, loaded via TINTBOOK_DATABASE__URL
}

// --- Weekly Schedule Config ---
/// One contiguous block of opening hours, wall-clock "HH:MM" strings.
/// Parsed and validated by the core when schedule rules are built.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HoursBlock {
    pub start: String,
    pub end: String,
}

/// Opening hours per weekday plus slot granularity.
///
/// Weekday keys are Sunday-indexed strings "0".."6" (the shape the shop's
/// original hours table used). A weekday missing from the map is closed.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: u32,
    /// Weekday on which the adjacency (cleanup buffer) rule applies.
    /// Sunday-indexed; defaults to Saturday.
    #[serde(default = "default_adjacency_weekday")]
    pub adjacency_weekday: u8,
    /// IANA timezone of the shop, e.g. "America/Guadeloupe".
    pub time_zone: Option<String>,
    #[serde(default = "default_hours")]
    pub hours: HashMap<String, Vec<HoursBlock>>,
}

fn default_slot_duration() -> u32 {
    60
}

fn default_adjacency_weekday() -> u8 {
    6
}

fn default_hours() -> HashMap<String, Vec<HoursBlock>> {
    let block = |start: &str, end: &str| {
        vec![HoursBlock {
            start: start.to_string(),
            end: end.to_string(),
        }]
    };
    let mut hours = HashMap::new();
    hours.insert("0".to_string(), block("10:00", "12:00")); // Sunday
    hours.insert("1".to_string(), Vec::new()); // Monday (closed)
    hours.insert("2".to_string(), block("14:00", "17:00"));
    hours.insert("3".to_string(), block("14:00", "17:00"));
    hours.insert("4".to_string(), block("14:00", "17:00"));
    hours.insert("5".to_string(), block("14:00", "17:00"));
    hours.insert("6".to_string(), block("09:00", "17:00")); // Saturday
    hours
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            slot_duration_minutes: default_slot_duration(),
            adjacency_weekday: default_adjacency_weekday(),
            time_zone: None,
            hours: default_hours(),
        }
    }
}

// --- Pricing Config ---
/// Price table in cents, keyed tier -> work item.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PricingConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_price_table")]
    pub tiers: HashMap<String, HashMap<String, i64>>,
}

fn default_currency() -> String {
    "eur".to_string()
}

fn default_price_table() -> HashMap<String, HashMap<String, i64>> {
    let tier = |front_doors: i64, rear_doors: i64, front_ws: i64, rear_ws: i64| {
        let mut items = HashMap::new();
        items.insert("front_doors".to_string(), front_doors);
        items.insert("rear_doors".to_string(), rear_doors);
        items.insert("front_windshield".to_string(), front_ws);
        items.insert("rear_windshield".to_string(), rear_ws);
        items
    };
    let mut tiers = HashMap::new();
    tiers.insert("carbon".to_string(), tier(4000, 4000, 8000, 8000));
    tiers.insert("ceramic".to_string(), tier(6000, 6000, 10000, 10000));
    tiers
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            currency: default_currency(),
            tiers: default_price_table(),
        }
    }
}

// --- Stripe Config ---
// Holds non-secret Stripe config. Secret key loaded directly from env var.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    pub success_url: String, // Mandatory
    pub cancel_url: String,  // Mandatory
    // Secret key loaded directly from env var: STRIPE_SECRET_KEY
    // Webhook signing secret loaded from env var: STRIPE_WEBHOOK_SECRET
}

// --- Google Calendar Mirror Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub calendar_id: Option<String>,
    /// Display zone for mirrored events; defaults to the schedule's zone.
    pub time_zone: Option<String>,
    // Bearer token loaded directly from env var: GCAL_API_TOKEN
}

// --- Admin Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    pub shared_secret: Option<String>, // Secret loaded via ADMIN_SHARED_SECRET marker
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_stripe: bool,
    #[serde(default)]
    pub use_gcal: bool,

    // --- Core Configuration ---
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub pricing: PricingConfig,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub stripe: Option<StripeConfig>,
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}
