//! PostgreSQL reader for the legacy directory.
//!
//! Services are paged by keyset on `services.id`. Child rows for a whole page
//! are fetched with one `= ANY($1)` query per child table and grouped back
//! onto their parent record.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use service_migration_shared::{
    Disposition, LegacyAgeRange, LegacyDayOpening, LegacyEndpoint, LegacyRecordFilter,
    LegacyServiceRecord, LegacySgsd, LegacySpecifiedOpening, MetadataCache,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::errors::LegacySourceError;
use crate::interfaces::{LegacyPage, LegacyRecordSource, PageCursor};

const SERVICE_COLUMNS: &str = "\
    id::int8 AS id, uid, typeid::int8 AS type_id, COALESCE(statusid, 0)::int8 AS status_id, \
    name, publicname AS public_name, odscode AS ods_code, email, \
    publicphone AS public_phone, nonpublicphone AS non_public_phone, fax, web, \
    address, town, postcode, latitude::float8 AS latitude, longitude::float8 AS longitude, \
    createdtime AS created_time, modifiedtime AS modified_time, \
    COALESCE(openallhours, false) AS open_all_hours";

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    uid: String,
    type_id: i64,
    status_id: i64,
    name: String,
    public_name: Option<String>,
    ods_code: Option<String>,
    email: Option<String>,
    public_phone: Option<String>,
    non_public_phone: Option<String>,
    fax: Option<String>,
    web: Option<String>,
    address: Option<String>,
    town: Option<String>,
    postcode: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_time: Option<NaiveDateTime>,
    modified_time: Option<NaiveDateTime>,
    open_all_hours: bool,
}

impl From<ServiceRow> for LegacyServiceRecord {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            uid: row.uid,
            type_id: row.type_id,
            status_id: row.status_id,
            name: row.name,
            public_name: row.public_name,
            ods_code: row.ods_code,
            email: row.email,
            public_phone: row.public_phone,
            non_public_phone: row.non_public_phone,
            fax: row.fax,
            web: row.web,
            address: row.address,
            town: row.town,
            postcode: row.postcode,
            latitude: row.latitude,
            longitude: row.longitude,
            created_time: row.created_time,
            modified_time: row.modified_time,
            open_all_hours: row.open_all_hours,
            ..Default::default()
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EndpointRow {
    service_id: i64,
    id: i64,
    endpoint_order: Option<i64>,
    transport: Option<String>,
    format: Option<String>,
    interaction: Option<String>,
    business_scenario: Option<String>,
    address: Option<String>,
    compression: Option<String>,
    comment: Option<String>,
}

/// Legacy source reading the `pathwaysdos` schema.
pub struct PostgresLegacySource {
    pool: sqlx::PgPool,
}

impl PostgresLegacySource {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Load every child table for `records` and attach the rows in place.
    async fn attach_children(
        &self,
        records: &mut [LegacyServiceRecord],
    ) -> Result<(), LegacySourceError> {
        if records.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
        let index: HashMap<i64, usize> = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id, position))
            .collect();

        let endpoints = sqlx::query_as::<_, EndpointRow>(
            "SELECT serviceid::int8 AS service_id, id::int8 AS id, endpointorder::int8 AS endpoint_order, \
                    transport, format, interaction, businessscenario AS business_scenario, \
                    address, iscompressionenabled AS compression, comment \
             FROM pathwaysdos.serviceendpoints WHERE serviceid = ANY($1) \
             ORDER BY serviceid, endpointorder, id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in endpoints {
            if let Some(&position) = index.get(&row.service_id) {
                records[position].endpoints.push(LegacyEndpoint {
                    id: row.id,
                    order: row.endpoint_order,
                    transport: row.transport,
                    format: row.format,
                    interaction: row.interaction,
                    business_scenario: row.business_scenario,
                    address: row.address,
                    compression: row.compression,
                    comment: row.comment,
                });
            }
        }

        let day_openings = sqlx::query_as::<_, (i64, i64, NaiveTime, NaiveTime)>(
            "SELECT o.serviceid::int8, o.dayid::int8, t.starttime, t.endtime \
             FROM pathwaysdos.servicedayopenings o \
             JOIN pathwaysdos.servicedayopeningtimes t ON t.servicedayopeningid = o.id \
             WHERE o.serviceid = ANY($1) \
             ORDER BY o.serviceid, o.dayid, t.starttime",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (service_id, day_id, start_time, end_time) in day_openings {
            if let Some(&position) = index.get(&service_id) {
                records[position].day_openings.push(LegacyDayOpening {
                    service_id,
                    day_id,
                    start_time,
                    end_time,
                });
            }
        }

        let specified = sqlx::query_as::<_, (i64, NaiveDate, NaiveTime, NaiveTime, bool)>(
            "SELECT d.serviceid::int8, d.date, t.starttime, t.endtime, t.isclosed \
             FROM pathwaysdos.servicespecifiedopeningdates d \
             JOIN pathwaysdos.servicespecifiedopeningtimes t ON t.servicespecifiedopeningdateid = d.id \
             WHERE d.serviceid = ANY($1) \
             ORDER BY d.serviceid, d.date, t.starttime",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (service_id, date, start_time, end_time, is_closed) in specified {
            if let Some(&position) = index.get(&service_id) {
                records[position]
                    .specified_openings
                    .push(LegacySpecifiedOpening {
                        service_id,
                        date,
                        start_time,
                        end_time,
                        is_closed,
                    });
            }
        }

        let sgsds = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT serviceid::int8, sgid::int8, sdid::int8 FROM pathwaysdos.servicesgsds \
             WHERE serviceid = ANY($1) ORDER BY serviceid, sgid, sdid",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (service_id, sg_id, sd_id) in sgsds {
            if let Some(&position) = index.get(&service_id) {
                records[position].sgsds.push(LegacySgsd { sg_id, sd_id });
            }
        }

        let dispositions = sqlx::query_as::<_, (i64, i64)>(
            "SELECT serviceid::int8, dispositionid::int8 FROM pathwaysdos.servicedispositions \
             WHERE serviceid = ANY($1) ORDER BY serviceid, dispositionid",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (service_id, disposition_id) in dispositions {
            if let Some(&position) = index.get(&service_id) {
                records[position].disposition_ids.push(disposition_id);
            }
        }

        let age_ranges = sqlx::query_as::<_, (i64, f64, f64)>(
            "SELECT serviceid::int8, daysfrom::float8, daysto::float8 FROM pathwaysdos.serviceagerange \
             WHERE serviceid = ANY($1) ORDER BY serviceid, daysfrom",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (service_id, days_from, days_to) in age_ranges {
            if let Some(&position) = index.get(&service_id) {
                records[position]
                    .age_ranges
                    .push(LegacyAgeRange { days_from, days_to });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl LegacyRecordSource for PostgresLegacySource {
    #[instrument(skip(self))]
    async fn read_by_id(&self, id: i64) -> Result<Option<LegacyServiceRecord>, LegacySourceError> {
        let query = format!("SELECT {SERVICE_COLUMNS} FROM pathwaysdos.services WHERE id = $1");
        let row = sqlx::query_as::<_, ServiceRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut records = vec![LegacyServiceRecord::from(row)];
        self.attach_children(&mut records).await?;
        Ok(records.pop())
    }

    #[instrument(skip(self, filter))]
    async fn read_page(
        &self,
        cursor: Option<PageCursor>,
        filter: &LegacyRecordFilter,
        page_size: usize,
    ) -> Result<LegacyPage, LegacySourceError> {
        let limit = i64::try_from(page_size)
            .map_err(|_| LegacySourceError::invalid_row(format!("page size {page_size} too large")))?;
        let query = format!(
            "SELECT {SERVICE_COLUMNS} FROM pathwaysdos.services \
             WHERE ($1::int8 IS NULL OR id > $1) \
               AND (cardinality($2::int8[]) = 0 OR typeid = ANY($2)) \
               AND (cardinality($3::int8[]) = 0 OR statusid = ANY($3)) \
             ORDER BY id LIMIT $4"
        );
        let rows = sqlx::query_as::<_, ServiceRow>(&query)
            .bind(cursor.map(|PageCursor(last_id)| last_id))
            .bind(&filter.type_ids)
            .bind(&filter.status_ids)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut records: Vec<LegacyServiceRecord> =
            rows.into_iter().map(LegacyServiceRecord::from).collect();
        self.attach_children(&mut records).await?;

        let next_cursor = if records.len() == page_size {
            records.last().map(|record| PageCursor(record.id))
        } else {
            None
        };
        debug!(
            records = records.len(),
            next_cursor = ?next_cursor,
            "Read legacy page"
        );

        Ok(LegacyPage {
            records,
            next_cursor,
        })
    }

    async fn read_metadata(&self) -> Result<MetadataCache, LegacySourceError> {
        let service_types: HashMap<i64, String> = sqlx::query_as::<_, (i64, String)>(
            "SELECT id::int8, name FROM pathwaysdos.servicetypes",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        let opening_time_days: HashMap<i64, String> = sqlx::query_as::<_, (i64, String)>(
            "SELECT id::int8, name FROM pathwaysdos.openingtimedays",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        let dispositions: HashMap<i64, Disposition> =
            sqlx::query_as::<_, (i64, String, String)>(
                "SELECT id::int8, dxcode, name FROM pathwaysdos.dispositions",
            )
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(id, code, name)| (id, Disposition { id, code, name }))
            .collect();

        Ok(MetadataCache::new(
            service_types,
            opening_time_days,
            dispositions,
        ))
    }
}
