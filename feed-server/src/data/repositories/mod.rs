pub(crate) mod postgres;

#[cfg(test)]
pub(crate) mod memory;
