use serde::{Deserialize, Serialize};

/// One raw directive pair as supplied by a caller. The key is an attribute
/// name with an optional leading `+` (add values) or `-` (remove values);
/// an unprefixed key replaces. `None` is the explicit null value.
pub type RawMod = (String, Option<String>);

/// An ordered batch of raw directives. Keys may repeat; repeated keys
/// accumulate values in order. Parsing into typed mutations happens in the
/// engine, once, at the boundary.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyRequest {
    pub mods: Vec<RawMod>,
}

impl ModifyRequest {
    pub fn new_list(mods: Vec<RawMod>) -> Self {
        ModifyRequest { mods }
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawMod> {
        self.mods.iter()
    }
}

#[cfg(test)]
mod test {
    use super::ModifyRequest;

    #[test]
    fn test_modify_request_wire_form() {
        let req = ModifyRequest::new_list(vec![
            ("mail_alias".to_string(), Some("a@example.com".to_string())),
            ("+mail_alias".to_string(), Some("b@example.com".to_string())),
            ("description".to_string(), None),
        ]);
        let js = serde_json::to_string(&req).expect("failed to serialise");
        let back: ModifyRequest = serde_json::from_str(&js).expect("failed to deserialise");
        assert_eq!(req, back);
        assert_eq!(back.len(), 3);
    }
}
