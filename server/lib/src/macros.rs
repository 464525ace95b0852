//! Fixture macros for the test modules.

/// Build an [`Entry`](crate::entry::Entry) with a set of initial attribute
/// values.
macro_rules! entry_init {
    ($kind:expr, $uuid:expr) => {{
        crate::entry::Entry::new($kind, $uuid)
    }};
    ($kind:expr, $uuid:expr, $(($attr:expr, $value:expr)),* $(,)?) => {{
        let mut e = crate::entry::Entry::new($kind, $uuid);
        $(
            e.add_ava($attr, $value);
        )*
        e
    }};
}

/// Build a wire-form [`ModifyRequest`](crate::prelude::ModifyRequest) from
/// `(key, Option<&str>)` directive pairs.
macro_rules! modreq {
    () => {{
        crate::prelude::ModifyRequest::new_list(Vec::new())
    }};
    ($(($key:expr, $value:expr)),* $(,)?) => {{
        crate::prelude::ModifyRequest::new_list(vec![
            $(
                ($key.to_string(), $value.map(|v: &str| v.to_string())),
            )*
        ])
    }};
}
