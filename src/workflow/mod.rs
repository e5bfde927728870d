pub mod auto_reply;
pub mod reply;

#[cfg(test)]
pub(crate) mod test_support;
