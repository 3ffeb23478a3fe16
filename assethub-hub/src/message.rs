/// A device-to-cloud message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    body: Vec<u8>,
    content_type: String,
    content_encoding: String,
    message_id: Option<String>,
}

impl Message {
    /// A UTF-8 encoded JSON message
    pub fn json<B: Into<String>>(body: B) -> Self {
        Self {
            body: body.into().into_bytes(),
            content_type: "application/json".to_owned(),
            content_encoding: "utf-8".to_owned(),
            message_id: None,
        }
    }

    pub fn with_message_id<S: Into<String>>(mut self, message_id: S) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_encoding(&self) -> &str {
        &self.content_encoding
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// System properties in the form the hub expects at the end of an MQTT
    /// publish topic, e.g. `$.ct=application%2Fjson&$.ce=utf-8`
    pub(crate) fn topic_properties(&self) -> String {
        let mut properties = vec![
            format!("$.ct={}", urlencoding::encode(&self.content_type)),
            format!("$.ce={}", urlencoding::encode(&self.content_encoding)),
        ];
        if let Some(message_id) = &self.message_id {
            properties.push(format!("$.mid={}", urlencoding::encode(message_id)));
        }
        properties.join("&")
    }
}
