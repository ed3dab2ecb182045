/// Name of the subscribed service, trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn parse(name: String) -> Result<ServiceName, String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(String::from("service_name is required"));
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
