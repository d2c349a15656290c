//! SQLite-backed store for `sales_sale`

use super::model::{Money, NewSale, Sale};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::Path;
use tracing::{debug, info};

/// Table the SQL generator is told about.
pub const SALES_TABLE: &str = "sales_sale";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS sales_sale (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    date DATE NOT NULL,
    price_sold DECIMAL(10,2) NOT NULL,
    price_purchased DECIMAL(10,2) NOT NULL,
    product_name VARCHAR(200) NOT NULL
)";

const SELECT_COLUMNS: &str = "SELECT id, date, \
    CAST(price_sold AS REAL) AS price_sold, \
    CAST(price_purchased AS REAL) AS price_purchased, \
    product_name FROM sales_sale";

/// Listing filters, all optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Case-insensitive substring of `product_name`
    pub search: Option<String>,
    /// Exact `product_name`
    pub product: Option<String>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub year: Option<i32>,
    /// Only applied together with `year`
    pub month: Option<u32>,
}

/// Sale record store
#[derive(Clone)]
pub struct SaleStore {
    pool: SqlitePool,
}

impl SaleStore {
    /// Open (and create if missing) the database file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        debug!(path = %path.as_ref().display(), "Opened sales store");
        Ok(Self { pool })
    }

    /// Create `sales_sale` if it does not exist
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("Schema ready: {}", SALES_TABLE);
        Ok(())
    }

    pub async fn insert(&self, sale: &NewSale) -> Result<Sale> {
        sale.validate()?;

        let id = sqlx::query(
            "INSERT INTO sales_sale (date, price_sold, price_purchased, product_name) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(sale.date.format("%Y-%m-%d").to_string())
        .bind(sale.price_sold.as_f64())
        .bind(sale.price_purchased.as_f64())
        .bind(sale.product_name.trim())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(id, product = %sale.product_name, "Inserted sale");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Sale> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sale {}", id)))?;

        sale_from_row(&row)
    }

    /// Newest first, ties broken by id
    pub async fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        builder.push(" WHERE 1 = 1");

        if let Some(search) = &filter.search {
            builder
                .push(" AND product_name LIKE ")
                .push_bind(format!("%{}%", escape_like(search)))
                .push(" ESCAPE '\\'");
        }
        if let Some(product) = &filter.product {
            builder.push(" AND product_name = ").push_bind(product.clone());
        }
        if let Some(date) = filter.date {
            builder.push(" AND date = ").push_bind(date.to_string());
        }
        if let Some(from) = filter.from {
            builder.push(" AND date >= ").push_bind(from.to_string());
        }
        if let Some(to) = filter.to {
            builder.push(" AND date <= ").push_bind(to.to_string());
        }
        if let Some(year) = filter.year {
            builder
                .push(" AND strftime('%Y', date) = ")
                .push_bind(format!("{:04}", year));
            if let Some(month) = filter.month {
                builder
                    .push(" AND strftime('%m', date) = ")
                    .push_bind(format!("{:02}", month));
            }
        }
        builder.push(" ORDER BY date DESC, id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(sale_from_row).collect()
    }

    /// Update one or both prices; profit follows on the next read
    pub async fn update_prices(
        &self,
        id: i64,
        price_sold: Option<Money>,
        price_purchased: Option<Money>,
    ) -> Result<Sale> {
        if price_sold.is_none() && price_purchased.is_none() {
            return Err(Error::InvalidInput("no price given".to_string()));
        }
        let price_sold = price_sold.map(Money::check_range).transpose()?;
        let price_purchased = price_purchased.map(Money::check_range).transpose()?;

        let affected = sqlx::query(
            "UPDATE sales_sale SET \
             price_sold = COALESCE(?, price_sold), \
             price_purchased = COALESCE(?, price_purchased) \
             WHERE id = ?",
        )
        .bind(price_sold.map(Money::as_f64))
        .bind(price_purchased.map(Money::as_f64))
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("sale {}", id)));
        }
        self.get(id).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Escapes LIKE wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn sale_from_row(row: &SqliteRow) -> Result<Sale> {
    let date: String = row.try_get("date")?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("bad date {:?}: {}", date, e)))?;

    Ok(Sale {
        id: row.try_get("id")?,
        date,
        price_sold: Money::from_f64(row.try_get("price_sold")?),
        price_purchased: Money::from_f64(row.try_get("price_purchased")?),
        product_name: row.try_get("product_name")?,
    })
}
