pub(crate) fn f64_from_usize(x: usize) -> f64 {
    // bin and weight counts never exceed `u32::MAX`
    u32::try_from(x).map_or(f64::from(u32::MAX), f64::from)
}
