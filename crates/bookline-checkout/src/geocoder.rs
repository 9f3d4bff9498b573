//! HTTP geocoder for Nominatim-compatible search APIs.

use std::time::Duration;

use async_trait::async_trait;
use bookline_core::{AppConfig, Coordinate};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::collaborators::{GeocodeError, Geocoder};

/// One search hit. Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Resolves addresses with `GET {base}search?q=<address>&format=json&limit=1`.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: Client,
    base_url: Url,
}

impl HttpGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Unavailable`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: Url, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// # Errors
    ///
    /// See [`HttpGeocoder::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        Self::new(
            config.geocoder_url.clone(),
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn search_url(&self) -> Result<Url, GeocodeError> {
        self.base_url
            .join("search")
            .map_err(|e| GeocodeError::Unavailable(format!("invalid geocoder URL: {e}")))
    }
}

fn parse_place(place: &Place) -> Result<Coordinate, GeocodeError> {
    let parse = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|e| GeocodeError::Unavailable(format!("malformed coordinate {raw:?}: {e}")))
    };
    let coordinate = Coordinate::new(parse(&place.lat)?, parse(&place.lon)?);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(GeocodeError::Unavailable(format!(
            "coordinate out of range: {}, {}",
            place.lat, place.lon
        )))
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::NotFound);
        }

        let response = self
            .client
            .get(self.search_url()?)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Unavailable(format!("geocoder returned HTTP {status}")));
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;
        let place = places.first().ok_or(GeocodeError::NotFound)?;
        let coordinate = parse_place(place)?;
        tracing::debug!(lat = coordinate.lat, lng = coordinate.lng, "address geocoded");
        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let place = Place {
            lat: "48.8566".into(),
            lon: " 2.3522".into(),
        };
        assert_eq!(parse_place(&place).unwrap(), Coordinate::new(48.8566, 2.3522));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let place = Place {
            lat: "120".into(),
            lon: "0".into(),
        };
        assert!(matches!(parse_place(&place), Err(GeocodeError::Unavailable(_))));
    }

    #[test]
    fn search_url_keeps_base_path() {
        let geocoder = HttpGeocoder::new(
            Url::parse("https://geo.example/nominatim/").unwrap(),
            "test",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            geocoder.search_url().unwrap().as_str(),
            "https://geo.example/nominatim/search"
        );
    }
}
