use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::ImportError;

/// One listing row as it appears in an import file. Mapping and validation
/// into a domain `Deal` happens separately.
#[derive(Debug, Clone, Deserialize)]
pub struct DealRow {
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "City", default)]
    pub city: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Zip", default)]
    pub zip: String,
    #[serde(rename = "Property Type", default, deserialize_with = "empty_as_none")]
    pub property_type: Option<String>,
    #[serde(rename = "Beds", default, deserialize_with = "blank_number")]
    pub beds: Option<u32>,
    #[serde(rename = "Baths", default, deserialize_with = "blank_number")]
    pub baths: Option<f64>,
    #[serde(rename = "Sqft", default, deserialize_with = "blank_number")]
    pub sqft: Option<u32>,
    #[serde(rename = "Year Built", default, deserialize_with = "blank_number")]
    pub year_built: Option<u16>,
    #[serde(rename = "List Price", default, deserialize_with = "blank_number")]
    pub list_price: Option<f64>,
    #[serde(rename = "HOA Monthly", default, deserialize_with = "blank_number")]
    pub hoa_monthly: Option<f64>,
    #[serde(rename = "Tax Annual", default, deserialize_with = "blank_number")]
    pub tax_annual: Option<f64>,
    #[serde(rename = "Insurance Annual", default, deserialize_with = "blank_number")]
    pub insurance_annual: Option<f64>,
    #[serde(rename = "Estimated Rent", default, deserialize_with = "blank_number")]
    pub estimated_rent: Option<f64>,
}

pub fn parse_deals<R: Read>(reader: R) -> Result<Vec<DealRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<DealRow>() {
        rows.push(record?);
    }
    Ok(rows)
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.trim().is_empty()))
}

fn blank_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Address,City,State,Zip,Property Type,Beds,Baths,Sqft,Year Built,List Price,HOA Monthly,Tax Annual,Insurance Annual,Estimated Rent";

    #[test]
    fn parses_full_and_sparse_rows() {
        let csv = format!(
            "{HEADER}\n\
             123 Main St,Des Moines,IA,50309,sfr,3,2,1400,1998,250000,0,3000,1250,2200\n\
             456 Oak Ln,Austin,TX,78701,,,,,,225000,,,,\n"
        );

        let rows = parse_deals(csv.as_bytes()).expect("csv parses");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].beds, Some(3));
        assert_eq!(rows[0].estimated_rent, Some(2200.0));
        assert_eq!(rows[1].property_type, None);
        assert_eq!(rows[1].list_price, Some(225000.0));
        assert_eq!(rows[1].beds, None);
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let csv = format!("{HEADER}\n789 Elm St,Austin,TX,78701,sfr,three,,,,225000,,,,\n");
        assert!(parse_deals(csv.as_bytes()).is_err());
    }
}
