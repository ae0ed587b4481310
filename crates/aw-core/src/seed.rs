//! Demo data seeding.
//!
//! Registers one account per role and records the sample batches, so a
//! fresh in-memory ledger is immediately usable from the web client.

use tracing::info;

use crate::auth::Role;
use crate::batch::{Compliance, NewBatch, PhysicalAsset, Tracer, Validation};
use crate::ledger::{BatchLedger, LedgerError, Signer};
use crate::wallet::WalletRegistry;

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "test123";

/// Demo accounts, one per role.
pub const DEMO_USERS: [(&str, Role); 5] = [
    ("producer1", Role::Producer),
    ("manufacturer1", Role::Manufacturer),
    ("distributor1", Role::Distributor),
    ("certifier1", Role::Certifier),
    ("admin1", Role::Admin),
];

/// What a seeding run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_registered: usize,
    pub batches_created: usize,
}

/// Seeds demo accounts and sample batches.
///
/// Does nothing when `producer1` is already registered.
pub async fn seed_demo_data(
    ledger: &dyn BatchLedger,
    wallets: &WalletRegistry,
) -> Result<SeedSummary, LedgerError> {
    let mut summary = SeedSummary::default();

    if ledger.get_account(DEMO_USERS[0].0).await?.is_some() {
        info!("Demo accounts already registered, skipping seed");
        return Ok(summary);
    }

    for (username, role) in DEMO_USERS {
        let (wallet, _) = wallets.get_or_create(username).await;
        ledger
            .register_user(username, DEMO_PASSWORD, role, &wallet.address)
            .await?;
        summary.users_registered += 1;
    }

    let (producer_wallet, _) = wallets.get_or_create(DEMO_USERS[0].0).await;
    let producer = Signer {
        username: DEMO_USERS[0].0.to_string(),
        address: producer_wallet.address,
        role: Role::Producer,
    };
    for batch in sample_batches() {
        ledger.create_batch(&producer, batch).await?;
        summary.batches_created += 1;
    }

    info!(
        users = summary.users_registered,
        batches = summary.batches_created,
        "Seeded demo data"
    );
    Ok(summary)
}

fn asset(
    asset_id: &str,
    material: &str,
    composition: &str,
    weight: &str,
    color: &str,
    batch_number: &str,
    dates: (&str, &str),
) -> PhysicalAsset {
    PhysicalAsset {
        asset_id: asset_id.to_string(),
        material: material.to_string(),
        composition: composition.to_string(),
        weight: weight.to_string(),
        color: color.to_string(),
        batch_number: batch_number.to_string(),
        production_date: dates.0.to_string(),
        expiry_date: dates.1.to_string(),
        ..Default::default()
    }
}

/// Organic cotton, merino wool and organic silk sample lots.
pub fn sample_batches() -> Vec<NewBatch> {
    vec![
        NewBatch {
            physical_asset: asset(
                "COTTON-2024-001",
                "Organic Cotton",
                "100% Organic Cotton Fibers, Color: Natural",
                "500",
                "#F5F5DC",
                "OC-2024-001",
                ("2024-01-15", "2026-01-15"),
            ),
            tracer: Tracer {
                supplier: "Green Fields Organic Farm".into(),
                farm_location: "Punjab Region".into(),
                country: "India".into(),
                gps_coordinates: "30.7333° N, 76.7794° E".into(),
                certifications: "GOTS Certified, Fair Trade".into(),
                harvest_date: "2024-01-10".into(),
                ..Default::default()
            },
            validation: Validation {
                quality_grade: "Premium A".into(),
                moisture_content: "7.5%".into(),
                contamination: "None Detected".into(),
                inspection_date: "2024-01-12".into(),
                inspector: "Dr. Priya Sharma".into(),
                lab_results: "Pesticide-free, Heavy metals within limits".into(),
                ..Default::default()
            },
            compliance: Compliance {
                regulatory_standards: "EU Organic Regulation 2018/848".into(),
                sustainability_cert: "GOTS, Organic Content Standard".into(),
                fair_trade_cert: "Fair Trade USA Certified".into(),
                organic_cert: "USDA Organic, EU Organic".into(),
                carbon_footprint: "2.1 kg CO2e per kg".into(),
                water_usage: "1800 liters per kg".into(),
                ..Default::default()
            },
        },
        NewBatch {
            physical_asset: asset(
                "WOOL-2024-002",
                "Merino Wool",
                "100% Fine Merino Wool, Color: N/A",
                "300",
                "#FFFFFF",
                "MW-2024-002",
                ("2024-02-20", "2029-02-20"),
            ),
            tracer: Tracer {
                supplier: "Mountain Meadows Ranch".into(),
                farm_location: "Southern Alps".into(),
                country: "New Zealand".into(),
                gps_coordinates: "44.0000° S, 170.0000° E".into(),
                certifications: "ZQ Merino Standard, RWS Certified".into(),
                harvest_date: "2024-02-15".into(),
                ..Default::default()
            },
            validation: Validation {
                quality_grade: "Superfine 17.5 micron".into(),
                moisture_content: "12%".into(),
                contamination: "Clean, No vegetable matter".into(),
                inspection_date: "2024-02-18".into(),
                inspector: "John McKenzie".into(),
                lab_results: "Fiber diameter 17.5μm, Strength 35 N/ktex".into(),
                ..Default::default()
            },
            compliance: Compliance {
                regulatory_standards: "Responsible Wool Standard (RWS)".into(),
                sustainability_cert: "ZQ Merino, Responsible Wool Standard".into(),
                fair_trade_cert: "Not Applicable".into(),
                organic_cert: "Not Applicable".into(),
                carbon_footprint: "15.2 kg CO2e per kg".into(),
                water_usage: "125 liters per kg".into(),
                ..Default::default()
            },
        },
        NewBatch {
            physical_asset: asset(
                "SILK-2024-003",
                "Organic Silk",
                "100% Organic Silk, Color: Light Blue",
                "250",
                "#ADD8E6",
                "OS-2024-003",
                ("2024-03-10", "2027-03-10"),
            ),
            tracer: Tracer {
                supplier: "Sustainable Silk Co.".into(),
                farm_location: "Suzhou Region".into(),
                country: "China".into(),
                gps_coordinates: "31.2989° N, 120.5853° E".into(),
                certifications: "GOTS Certified, Organic".into(),
                harvest_date: "2024-03-05".into(),
                ..Default::default()
            },
            validation: Validation {
                quality_grade: "Premium Grade A".into(),
                moisture_content: "11%".into(),
                contamination: "None".into(),
                inspection_date: "2024-03-08".into(),
                inspector: "Li Wei".into(),
                lab_results: "Excellent quality, no defects".into(),
                ..Default::default()
            },
            compliance: Compliance {
                regulatory_standards: "GOTS, Organic Content Standard".into(),
                sustainability_cert: "GOTS Certified".into(),
                fair_trade_cert: "Fair Trade Certified".into(),
                organic_cert: "Organic".into(),
                carbon_footprint: "3.5 kg CO2e per kg".into(),
                water_usage: "2500 liters per kg".into(),
                ..Default::default()
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::wallet::TokenType;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let ledger = InMemoryLedger::new();
        let wallets = WalletRegistry::new();

        let first = seed_demo_data(&ledger, &wallets).await.unwrap();
        assert_eq!(
            first,
            SeedSummary {
                users_registered: 5,
                batches_created: 3
            }
        );
        assert_eq!(wallets.len().await, 5);

        let second = seed_demo_data(&ledger, &wallets).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(ledger.batch_ids().await.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_sample_batches_cover_three_tokens() {
        let tokens: Vec<TokenType> = sample_batches()
            .iter()
            .map(|b| TokenType::for_asset(&b.physical_asset))
            .collect();
        assert_eq!(tokens, vec![TokenType::Cotton, TokenType::Wool, TokenType::Silk]);
        assert!(sample_batches().iter().all(|b| b.validate().is_ok()));
    }
}
