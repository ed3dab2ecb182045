/// Monthly price in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Price(i32);

impl Price {
    pub fn parse(value: i64) -> Result<Price, String> {
        if value < 0 {
            return Err(String::from("price must be >= 0"));
        }

        i32::try_from(value)
            .map(Self)
            .map_err(|_| format!("price must be <= {}", i32::MAX))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}
