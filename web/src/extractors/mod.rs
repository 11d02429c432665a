pub(crate) mod json_or_form;

pub(crate) use json_or_form::JsonOrForm;
