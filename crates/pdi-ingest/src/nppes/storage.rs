//! Storage layer for normalized provider records
//!
//! Writes one provider and its dependent rows across four tables, in a fixed
//! order, against a transaction owned by the caller. The provider row must
//! exist before any dependent row is written; the dependent tables carry no
//! foreign keys, so insertion order is the only thing upholding that
//! relationship.
//!
//! This layer never begins, commits or rolls back the transaction; the
//! pipeline does, once for the whole run.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Postgres, Transaction};
use tracing::debug;

use super::normalize::{InsuranceRow, LocationRow, NormalizedProvider, SpecialtyRow};

/// Storage handler for one ingestion run
///
/// Carries the run's search specialty tag, stamped onto every provider row.
pub struct ProviderStore {
    specialty: String,
}

impl ProviderStore {
    /// Create a storage handler for a run
    pub fn new(specialty: impl Into<String>) -> Self {
        Self {
            specialty: specialty.into(),
        }
    }

    /// Store one normalized provider and all of its dependent rows
    ///
    /// Order is load-bearing: provider upsert first (its confirmed NPI keys
    /// everything else), then specialties, insurance plans, locations. Any
    /// failure propagates to the caller with nothing compensated locally.
    pub async fn store_provider_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        provider: &NormalizedProvider,
        state: &str,
    ) -> Result<()> {
        debug!(npi = %provider.npi, state, "Storing provider");

        let npi = self.upsert_provider_tx(tx, provider, state).await?;
        self.insert_specialties_tx(tx, &npi, &provider.specialties)
            .await?;
        self.insert_insurance_plans_tx(tx, &npi, &provider.insurance_plans)
            .await?;
        self.upsert_locations_tx(tx, &npi, &provider.locations)
            .await?;

        Ok(())
    }

    /// Upsert the provider row; on conflict only the mutable attribute set
    /// is overwritten. Returns the confirmed NPI for the dependent writes.
    async fn upsert_provider_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        provider: &NormalizedProvider,
        state: &str,
    ) -> Result<String> {
        let now_ms = Utc::now().timestamp_millis();

        let npi = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO healthcare_providers (
                npi, npi_type, full_name, title, country, first_name,
                last_name, gender, nppes_created_at, nppes_updated_at,
                internal_updated_at, internal_created_at, sole_proprietor,
                years_experience, is_active, state, specialty
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (npi) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                title = EXCLUDED.title,
                country = EXCLUDED.country,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                gender = EXCLUDED.gender,
                state = EXCLUDED.state,
                internal_updated_at = EXCLUDED.internal_updated_at,
                sole_proprietor = EXCLUDED.sole_proprietor,
                years_experience = EXCLUDED.years_experience,
                is_active = EXCLUDED.is_active
            RETURNING npi
            "#,
        )
        .bind(&provider.npi)
        .bind(&provider.npi_type)
        .bind(&provider.full_name)
        .bind(provider.title.as_deref())
        .bind(provider.country.as_deref())
        .bind(&provider.first_name)
        .bind(&provider.last_name)
        .bind(provider.gender.as_deref())
        .bind(provider.nppes_created_at)
        .bind(provider.nppes_updated_at)
        .bind(now_ms)
        .bind(now_ms)
        .bind(provider.sole_proprietor)
        .bind(provider.years_experience)
        .bind(provider.is_active)
        .bind(state)
        .bind(&self.specialty)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("Failed to upsert provider {}", provider.npi))?;

        Ok(npi)
    }

    /// Insert specialty rows; existing rows are left untouched
    async fn insert_specialties_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        npi: &str,
        specialties: &[SpecialtyRow],
    ) -> Result<()> {
        for row in specialties {
            sqlx::query(
                r#"
                INSERT INTO specialties (provider_npi, specialty, state, license, is_primary, code)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (provider_npi, specialty, license, state, code) DO NOTHING
                "#,
            )
            .bind(npi)
            .bind(&row.specialty)
            .bind(row.state.as_deref())
            .bind(row.license.as_deref())
            .bind(row.is_primary)
            .bind(row.code.as_deref())
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert specialty for {}", npi))?;
        }
        Ok(())
    }

    /// Insert insurance plan rows; existing rows are left untouched
    async fn insert_insurance_plans_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        npi: &str,
        plans: &[InsuranceRow],
    ) -> Result<()> {
        for row in plans {
            sqlx::query(
                r#"
                INSERT INTO insurance_plans (provider_npi, insurance, identifier)
                VALUES ($1, $2, $3)
                ON CONFLICT (provider_npi, insurance, identifier) DO NOTHING
                "#,
            )
            .bind(npi)
            .bind(row.insurance.as_deref())
            .bind(row.identifier.as_deref())
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert insurance plan for {}", npi))?;
        }
        Ok(())
    }

    /// Upsert location rows; on conflict only the phone number moves
    async fn upsert_locations_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        npi: &str,
        locations: &[LocationRow],
    ) -> Result<()> {
        for row in locations {
            sqlx::query(
                r#"
                INSERT INTO locations (provider_npi, address, city, state, phone, address_purpose, postal_code)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (provider_npi, address, city, state, address_purpose) DO UPDATE SET
                    phone = EXCLUDED.phone
                "#,
            )
            .bind(npi)
            .bind(&row.address)
            .bind(&row.city)
            .bind(&row.state)
            .bind(row.phone.as_deref())
            .bind(&row.purpose)
            .bind(row.postal_code.as_deref())
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to upsert location for {}", npi))?;
        }
        Ok(())
    }
}
