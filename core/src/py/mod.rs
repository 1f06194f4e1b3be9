use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

// ──────────────────────────────────────────────────────────────────────────────
// Tynne wrappere rundt JSON-fasaden: str inn, str ut
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn time_in_zones_json(json_in: &str) -> PyResult<String> {
    crate::time_in_zones_json(json_in).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pyfunction]
fn analyze_activities_json(json_in: &str) -> PyResult<String> {
    crate::analyze_activities_json(json_in).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pyfunction]
fn extract_plan_json(json_in: &str) -> PyResult<String> {
    crate::extract_plan_json(json_in).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Python: `dict` eller `str` inn → `dict` ut (via json-modulen, uten pyo3 serde-feature)
#[pyfunction]
fn analyze_activities(py: Python<'_>, payload: &PyAny) -> PyResult<PyObject> {
    let json_mod = py.import("json")?;

    // 1) str direkte, ellers json.dumps
    let json_in: String = if let Ok(s) = payload.extract::<&str>() {
        s.to_owned()
    } else {
        json_mod
            .call_method1("dumps", (payload,))
            .and_then(|o| o.extract::<String>())
            .map_err(|e| PyValueError::new_err(format!("failed to serialize payload with json.dumps: {e}")))?
    };

    // 2) kjerne
    let out = crate::analyze_activities_json(&json_in)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    // 3) tilbake som dict
    let obj = json_mod.call_method1("loads", (out.as_str(),))?;
    Ok(obj.into_py(py))
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-MODUL
// ──────────────────────────────────────────────────────────────────────────────

#[pymodule]
fn zoneplan_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(time_in_zones_json, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_activities_json, m)?)?;
    m.add_function(wrap_pyfunction!(extract_plan_json, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_activities, m)?)?;
    Ok(())
}
