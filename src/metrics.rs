use prometheus::{Encoder, GaugeVec, TextEncoder};
use sunweg_rs::integration::Integration;
use sunweg_rs::SunWegApi;

lazy_static! {
    static ref SENSOR_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("sunweg_sensor", "latest published value of a SunWEG sensor"),
        &["entry_id", "unique_id", "name", "device_type"],
    )
    .unwrap();
    static ref UPDATE_SUCCESS_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "sunweg_last_update_success",
            "1 if the last refresh of the entry succeeded, 0 otherwise",
        ),
        &["entry_id"],
    )
    .unwrap();
}

/// Feed the current state of every sensor into the Prometheus registry. Sensors without a
/// numeric value are left out.
pub fn collect<A: SunWegApi + 'static>(integration: &Integration<A>) {
    for (entry_id, entry) in integration.entries() {
        let success = entry.coordinator.last_update_success();
        UPDATE_SUCCESS_GAUGE
            .with_label_values(&[&entry_id])
            .set(if success { 1.0 } else { 0.0 });

        for state in entry.sensor_states() {
            let labels = [
                entry_id.as_str(),
                state.unique_id.as_str(),
                state.name.as_str(),
                state.device_type.as_str(),
            ];

            match state.value.as_ref().and_then(|v| v.as_f64()) {
                Some(value) => SENSOR_GAUGE.with_label_values(&labels).set(value),
                None => {
                    /* Value vanished or is not numeric, drop a stale series if there is one */
                    let _ = SENSOR_GAUGE.remove_label_values(&labels);
                }
            }
        }
    }
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, sunweg_rs::Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(sunweg_rs::Error::FormatError))?;
    String::from_utf8(buffer).or(Err(sunweg_rs::Error::FormatError))
}
