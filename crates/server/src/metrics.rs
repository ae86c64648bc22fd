//! Prometheus metrics for the EIR server, grounded on the gateway crate's
//! `GatewayMetrics` (registry-owned `*Vec` counters plus a couple of plain
//! gauges/histograms).

use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

pub struct ServerMetrics {
    pub equipment_check_total: CounterVec,
    pub equipment_check_duration: HistogramVec,
    pub database_query_duration: HistogramVec,
    pub cache_hit_total: CounterVec,
    pub active_diameter_connections: Gauge,
    pub equipment_by_status: GaugeVec,
}

impl ServerMetrics {
    pub fn new(registry: &Registry) -> Self {
        let equipment_check_total = CounterVec::new(
            Opts::new(
                "eir_equipment_check_total",
                "Total number of equipment status checks",
            )
            .namespace("eir"),
            &["source", "status"],
        )
        .expect("failed to create eir_equipment_check_total metric");

        let equipment_check_duration = HistogramVec::new(
            HistogramOpts::new(
                "eir_equipment_check_duration_seconds",
                "Equipment check latency in seconds",
            )
            .namespace("eir")
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["source", "status"],
        )
        .expect("failed to create eir_equipment_check_duration_seconds metric");

        let database_query_duration = HistogramVec::new(
            HistogramOpts::new(
                "eir_database_query_duration_seconds",
                "Repository query latency in seconds",
            )
            .namespace("eir")
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["operation"],
        )
        .expect("failed to create eir_database_query_duration_seconds metric");

        let cache_hit_total = CounterVec::new(
            Opts::new("eir_cache_hit_total", "Cache lookups by result").namespace("eir"),
            &["result"],
        )
        .expect("failed to create eir_cache_hit_total metric");

        let active_diameter_connections = Gauge::with_opts(
            Opts::new(
                "eir_active_diameter_connections",
                "Number of established Diameter peer connections",
            )
            .namespace("eir"),
        )
        .expect("failed to create eir_active_diameter_connections metric");

        let equipment_by_status = GaugeVec::new(
            Opts::new(
                "eir_equipment_by_status",
                "Provisioned equipment count by status",
            )
            .namespace("eir"),
            &["status"],
        )
        .expect("failed to create eir_equipment_by_status metric");

        registry
            .register(Box::new(equipment_check_total.clone()))
            .expect("failed to register eir_equipment_check_total");
        registry
            .register(Box::new(equipment_check_duration.clone()))
            .expect("failed to register eir_equipment_check_duration_seconds");
        registry
            .register(Box::new(database_query_duration.clone()))
            .expect("failed to register eir_database_query_duration_seconds");
        registry
            .register(Box::new(cache_hit_total.clone()))
            .expect("failed to register eir_cache_hit_total");
        registry
            .register(Box::new(active_diameter_connections.clone()))
            .expect("failed to register eir_active_diameter_connections");
        registry
            .register(Box::new(equipment_by_status.clone()))
            .expect("failed to register eir_equipment_by_status");

        Self {
            equipment_check_total,
            equipment_check_duration,
            database_query_duration,
            cache_hit_total,
            active_diameter_connections,
            equipment_by_status,
        }
    }
}
