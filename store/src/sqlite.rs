//! SQLite-backed country repository.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info, instrument};

use countrycache_common::{CacheResult, CountryCacheError, CountryKey, CurrencyCode, MergedCountry};

use crate::repository::CountryRepository;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    name_key          TEXT PRIMARY KEY NOT NULL,
    name              TEXT NOT NULL,
    capital           TEXT,
    region            TEXT NOT NULL,
    population        INTEGER NOT NULL,
    currency_code     TEXT,
    exchange_rate     REAL,
    estimated_gdp     REAL,
    flag_url          TEXT,
    last_refreshed_at TEXT NOT NULL
)
"#;

const INSERT_ROW: &str = r#"
INSERT INTO countries (
    name_key, name, capital, region, population, currency_code,
    exchange_rate, estimated_gdp, flag_url, last_refreshed_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

const SELECT_ALL: &str = r#"
SELECT name, capital, region, population, currency_code,
       exchange_rate, estimated_gdp, flag_url, last_refreshed_at
FROM countries
ORDER BY name_key
"#;

/// Country table in a SQLite database.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `url` (for example `sqlite:///tmp/countries.db`),
    /// creating the database file and table if missing.
    #[instrument]
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| CountryCacheError::Configuration(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(CountryCacheError::storage)?;

        let repo = Self { pool };
        repo.migrate().await?;

        info!("Connected to country database");
        Ok(repo)
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> CacheResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(CountryCacheError::storage)?;

        // Every connection to :memory: is a separate database; keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(CountryCacheError::storage)?;

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    async fn migrate(&self) -> CacheResult<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(CountryCacheError::storage)?;
        Ok(())
    }

    /// Number of stored rows.
    pub async fn count(&self) -> CacheResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await
            .map_err(CountryCacheError::storage)?;
        Ok(count as usize)
    }
}

fn decode_row(row: &SqliteRow) -> Result<MergedCountry, sqlx::Error> {
    let population: i64 = row.try_get("population")?;
    let currency_code: Option<String> = row.try_get("currency_code")?;

    Ok(MergedCountry {
        name: row.try_get("name")?,
        capital: row.try_get("capital")?,
        region: row.try_get("region")?,
        population: u64::try_from(population).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        currency_code: currency_code.map(CurrencyCode::new),
        exchange_rate: row.try_get("exchange_rate")?,
        estimated_gdp: row.try_get("estimated_gdp")?,
        flag_url: row.try_get("flag_url")?,
        last_refreshed_at: row.try_get("last_refreshed_at")?,
    })
}

#[async_trait]
impl CountryRepository for SqliteRepository {
    async fn load_all(&self) -> CacheResult<Vec<MergedCountry>> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(CountryCacheError::storage)?;

        rows.iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(CountryCacheError::storage)
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn replace_all(&self, rows: &[MergedCountry]) -> CacheResult<()> {
        let mut tx = self.pool.begin().await.map_err(CountryCacheError::storage)?;

        sqlx::query("DELETE FROM countries")
            .execute(&mut *tx)
            .await
            .map_err(CountryCacheError::storage)?;

        for row in rows {
            let population = i64::try_from(row.population).map_err(|_| {
                CountryCacheError::Storage(format!("population of {} out of range", row.name))
            })?;

            sqlx::query(INSERT_ROW)
                .bind(CountryKey::new(&row.name).as_str())
                .bind(row.name.as_str())
                .bind(row.capital.as_deref())
                .bind(row.region.as_str())
                .bind(population)
                .bind(row.currency_code.as_ref().map(CurrencyCode::as_str))
                .bind(row.exchange_rate)
                .bind(row.estimated_gdp)
                .bind(row.flag_url.as_deref())
                .bind(row.last_refreshed_at)
                .execute(&mut *tx)
                .await
                .map_err(CountryCacheError::storage)?;
        }

        // Dropping `tx` on any error above rolls back.
        tx.commit().await.map_err(CountryCacheError::storage)?;

        debug!("Country table replaced");
        Ok(())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE name_key = ?1")
            .bind(CountryKey::new(name).as_str())
            .execute(&self.pool)
            .await
            .map_err(CountryCacheError::storage)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countrycache_common::time;

    fn row(name: &str, currency: Option<&str>, rate: Option<f64>, gdp: Option<f64>) -> MergedCountry {
        MergedCountry {
            name: name.to_string(),
            capital: Some(format!("{} City", name)),
            region: "Africa".to_string(),
            population: 200_000_000,
            currency_code: currency.map(CurrencyCode::new),
            exchange_rate: rate,
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: time::now(),
        }
    }

    #[tokio::test]
    async fn test_replace_and_load() {
        let repo = SqliteRepository::in_memory().await.unwrap();

        let rows = vec![
            row("Nigeria", Some("NGN"), Some(1500.0), Some(2.0e11)),
            row("Vatican", None, None, Some(0.0)),
            row("Nowhere", Some("ZZZ"), None, None),
        ];
        repo.replace_all(&rows).await.unwrap();

        let mut loaded = repo.load_all().await.unwrap();
        loaded.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(loaded.len(), 3);
        let nigeria = loaded.iter().find(|r| r.name == "Nigeria").unwrap();
        assert_eq!(nigeria.currency_code, Some(CurrencyCode::new("NGN")));
        assert_eq!(nigeria.exchange_rate, Some(1500.0));
        assert_eq!(nigeria.capital.as_deref(), Some("Nigeria City"));

        let vatican = loaded.iter().find(|r| r.name == "Vatican").unwrap();
        assert_eq!(vatican.currency_code, None);
        assert_eq!(vatican.estimated_gdp, Some(0.0));

        let nowhere = loaded.iter().find(|r| r.name == "Nowhere").unwrap();
        assert_eq!(nowhere.exchange_rate, None);
        assert_eq!(nowhere.estimated_gdp, None);
    }

    #[tokio::test]
    async fn test_replace_drops_vanished_rows() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.replace_all(&[row("Chad", None, None, Some(0.0)), row("Mali", None, None, Some(0.0))])
            .await
            .unwrap();
        repo.replace_all(&[row("Mali", None, None, Some(0.0))]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_replace_rolls_back() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.replace_all(&[row("Chad", None, None, Some(0.0))]).await.unwrap();

        // Same key twice violates the primary key half way through the insert loop.
        let result = repo
            .replace_all(&[row("Mali", None, None, Some(0.0)), row("MALI", None, None, Some(0.0))])
            .await;
        assert!(matches!(result, Err(CountryCacheError::Storage(_))));

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Chad");
    }

    #[tokio::test]
    async fn test_delete_by_name_ignores_case() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.replace_all(&[row("Ghana", Some("GHS"), Some(12.0), Some(1.0))]).await.unwrap();

        assert!(repo.delete("ghana").await.unwrap());
        assert!(!repo.delete("Ghana").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_database_survives_reconnect() {
        let path = std::env::temp_dir().join(format!("countrycache-test-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let url = format!("sqlite://{}", path.display());

        {
            let repo = SqliteRepository::connect(&url).await.unwrap();
            tokio_test::assert_ok!(repo.replace_all(&[row("Kenya", Some("KES"), Some(129.0), Some(5.0))]).await);
            repo.pool.close().await;
        }

        let repo = SqliteRepository::connect(&url).await.unwrap();
        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Kenya");
        assert_eq!(loaded[0].exchange_rate, Some(129.0));

        repo.pool.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
