use std::borrow::Cow;

use ac_cv::{
    ImageView, MatchError, MatchResult, MatcherOptions, MultiScaleMatcher, MultiScaleOptions,
    MultiScaleResult, SingleMatcher, pack_pixels,
};
use image::GrayImage;
use numpy::{PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: MatchError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Row-major pixels of `array`, borrowed when the array is C-contiguous.
fn pixels<'a>(array: &'a PyReadonlyArrayDyn<'_, u8>) -> PyResult<Cow<'a, [u8]>> {
    if array.is_c_contiguous() {
        if let Ok(slice) = array.as_slice() {
            return Ok(Cow::Borrowed(slice));
        }
    }
    let view = array.as_array();
    pack_pixels(array.shape(), |index| view[index])
        .map(Cow::Owned)
        .map_err(to_py_err)
}

/// Copies a `(H, W)`, `(H, W, 1)`, `(H, W, 3)` or `(H, W, 4)` uint8 array into a gray image.
///
/// The copy is taken while the interpreter lock is still held, so matching never reads a
/// buffer Python code could be writing to.
fn gray_image_from_py(array: &PyReadonlyArrayDyn<'_, u8>) -> PyResult<GrayImage> {
    let data = pixels(array)?;
    let view = ImageView::from_shape(array.shape(), &data).map_err(to_py_err)?;
    view.to_luma8().map_err(to_py_err)
}

// --- Result types ---

#[pyclass(frozen, get_all, name = "MatchResult")]
#[derive(Clone)]
struct PyMatchResult {
    score: f32,
    x: f32,
    y: f32,
}

impl From<MatchResult> for PyMatchResult {
    fn from(res: MatchResult) -> Self {
        Self {
            score: res.score,
            x: res.x,
            y: res.y,
        }
    }
}

#[pymethods]
impl PyMatchResult {
    /// `[score, x, y]`
    fn to_list(&self) -> [f32; 3] {
        [self.score, self.x, self.y]
    }

    fn __len__(&self) -> usize {
        3
    }

    fn __getitem__(&self, index: isize) -> PyResult<f32> {
        let values = self.to_list();
        let index = if index < 0 { index + 3 } else { index };
        usize::try_from(index)
            .ok()
            .and_then(|i| values.get(i).copied())
            .ok_or_else(|| PyIndexError::new_err("MatchResult index out of range"))
    }

    fn __repr__(&self) -> String {
        format!(
            "MatchResult(score={}, x={}, y={})",
            self.score, self.x, self.y
        )
    }
}

#[pyclass(frozen, get_all, name = "MultiScaleResult")]
#[derive(Clone)]
struct PyMultiScaleResult {
    score: f32,
    x: f32,
    y: f32,
    scale: f32,
}

impl From<MultiScaleResult> for PyMultiScaleResult {
    fn from(res: MultiScaleResult) -> Self {
        Self {
            score: res.score,
            x: res.x,
            y: res.y,
            scale: res.scale,
        }
    }
}

#[pymethods]
impl PyMultiScaleResult {
    fn __repr__(&self) -> String {
        format!(
            "MultiScaleResult(score={}, x={}, y={}, scale={})",
            self.score, self.x, self.y, self.scale
        )
    }
}

// --- Matching ---

fn match_best<'py>(
    py: Python<'py>,
    source: &PyReadonlyArrayDyn<'py, u8>,
    template: &PyReadonlyArrayDyn<'py, u8>,
) -> PyResult<MatchResult> {
    let source = gray_image_from_py(source)?;
    let template = gray_image_from_py(template)?;
    let method = MatcherOptions::default().method;
    py.detach(move || SingleMatcher::match_gray(&source, &template, method))
        .map_err(to_py_err)
}

/// Match `template` in `source`, returning `[score, x, y]`.
///
/// Empty arrays give `[0.0, 0.0, 0.0]`.
#[pyfunction]
fn match_template_native<'py>(
    py: Python<'py>,
    source: PyReadonlyArrayDyn<'py, u8>,
    template: PyReadonlyArrayDyn<'py, u8>,
) -> PyResult<[f32; 3]> {
    match_best(py, &source, &template).map(|res| res.to_array())
}

/// Match `template` in `source`.
#[pyfunction]
fn match_template<'py>(
    py: Python<'py>,
    source: PyReadonlyArrayDyn<'py, u8>,
    template: PyReadonlyArrayDyn<'py, u8>,
) -> PyResult<PyMatchResult> {
    match_best(py, &source, &template).map(PyMatchResult::from)
}

/// Match `template` in `source` at scales from `min_scale` to `max_scale`.
#[pyfunction]
#[pyo3(signature = (source, template, min_scale=None, max_scale=None, step=None))]
fn match_multi_scale<'py>(
    py: Python<'py>,
    source: PyReadonlyArrayDyn<'py, u8>,
    template: PyReadonlyArrayDyn<'py, u8>,
    min_scale: Option<f32>,
    max_scale: Option<f32>,
    step: Option<f32>,
) -> PyResult<PyMultiScaleResult> {
    let defaults = MultiScaleOptions::default();
    let scales = MultiScaleOptions::new(
        min_scale.unwrap_or(defaults.min_scale),
        max_scale.unwrap_or(defaults.max_scale),
        step.unwrap_or(defaults.step),
    );
    let source = gray_image_from_py(&source)?;
    let template = gray_image_from_py(&template)?;
    let options = MatcherOptions::default();
    py.detach(move || MultiScaleMatcher::match_gray(&source, &template, &options, &scales))
        .map(PyMultiScaleResult::from)
        .map_err(to_py_err)
}

/// Whether the best match of `template` scores at least `threshold`.
#[pyfunction]
#[pyo3(signature = (source, template, threshold=None))]
fn is_template_present<'py>(
    py: Python<'py>,
    source: PyReadonlyArrayDyn<'py, u8>,
    template: PyReadonlyArrayDyn<'py, u8>,
    threshold: Option<f32>,
) -> PyResult<bool> {
    let mut options = MatcherOptions::default();
    if let Some(threshold) = threshold {
        options = options.with_threshold(threshold);
    }
    let res = match_best(py, &source, &template)?;
    Ok(options.accepts(res.score))
}

// --- Module Definition ---

#[pyo3::pymodule]
mod _auto_clicker {
    #[pymodule_export]
    use super::PyMatchResult;
    #[pymodule_export]
    use super::PyMultiScaleResult;
    #[pymodule_export]
    use super::is_template_present;
    #[pymodule_export]
    use super::match_multi_scale;
    #[pymodule_export]
    use super::match_template;
    #[pymodule_export]
    use super::match_template_native;
}
