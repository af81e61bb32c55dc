pub(crate) mod orchestrate;
