#![no_main]
use libfuzzer_sys::fuzz_target;
use soh_traits::{Scaler, SequenceModel};

fuzz_target!(|data: &str| {
    // Any model that loads must evaluate its declared input shape without panicking.
    if let Ok(model) = soh_artifacts::parse_model(data) {
        let (rows, cols) = (model.window_size(), model.n_features());
        if rows.saturating_mul(cols) <= 4096 {
            let _ = model.predict(&vec![0.5; rows * cols], rows, cols);
        }
    }
    if let Ok(scaler) = soh_artifacts::parse_scaler(data) {
        let n = scaler.features();
        let _ = scaler.transform(&vec![1.0; n * 2], n);
        let _ = scaler.inverse_transform(&vec![1.0; n], n);
    }
});
