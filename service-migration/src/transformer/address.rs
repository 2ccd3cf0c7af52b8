//! Formatting of the legacy `$`-separated address string.

use service_migration_shared::Address;

const INVALID_ADDRESS_INDICATORS: &[&str] = &["not available"];

const UK_COUNTIES: &[&str] = &[
    "Bedfordshire", "Berkshire", "Bristol", "Buckinghamshire", "Cambridgeshire", "Cheshire",
    "City of London", "Cornwall", "County Durham", "Cumbria", "Derbyshire", "Devon", "Dorset",
    "East Riding of Yorkshire", "East Sussex", "Essex", "Gloucestershire", "Greater London",
    "Greater Manchester", "Hampshire", "Herefordshire", "Hertfordshire", "Isle of Wight", "Kent",
    "Lancashire", "Leicestershire", "Lincolnshire", "Merseyside", "Norfolk", "North Yorkshire",
    "Northamptonshire", "Northumberland", "Nottinghamshire", "Oxfordshire", "Rutland",
    "Shropshire", "Somerset", "South Yorkshire", "Staffordshire", "Suffolk", "Surrey",
    "Tyne and Wear", "Warwickshire", "West Midlands", "West Sussex", "West Yorkshire",
    "Wiltshire", "Worcestershire", "Anglesey", "Cardiff", "Carmarthenshire", "Ceredigion",
    "Conwy", "Denbighshire", "Flintshire", "Gwynedd", "Monmouthshire", "Pembrokeshire", "Powys",
    "Swansea", "Aberdeenshire", "Angus", "Argyll and Bute", "Fife", "Highland", "Midlothian",
    "Moray", "Perth and Kinross", "Scottish Borders", "Stirling",
];

/// Lowercase with surrounding whitespace trimmed and internal runs collapsed.
fn normalise(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn county_name(segment: &str) -> Option<&'static str> {
    let normalised = normalise(segment);
    UK_COUNTIES
        .iter()
        .copied()
        .find(|county| normalise(county) == normalised)
}

/// Split the legacy address into canonical lines.
///
/// Returns `None` when the address is empty or marked as not available. The
/// town and postcode are carried through unchanged.
pub fn format_address(
    address: Option<&str>,
    town: Option<&str>,
    postcode: Option<&str>,
) -> Option<Address> {
    let address = address.map(str::trim).filter(|address| !address.is_empty())?;
    if INVALID_ADDRESS_INDICATORS.contains(&normalise(address).as_str()) {
        return None;
    }

    let town_normalised = town.map(normalise).unwrap_or_default();
    let mut segments: Vec<&str> = Vec::new();
    for segment in address.split('$').map(str::trim).filter(|s| !s.is_empty()) {
        let normalised = normalise(segment);
        if !town_normalised.is_empty() && normalised == town_normalised {
            continue;
        }
        if segments.last().map(|last| normalise(last)) == Some(normalised) {
            continue;
        }
        segments.push(segment);
    }

    // The county is searched from the last segment backwards.
    let county = segments
        .iter()
        .enumerate()
        .rev()
        .find_map(|(position, segment)| county_name(segment).map(|county| (position, county)));
    let county = county.map(|(position, county)| {
        segments.remove(position);
        title_case(county)
    });

    let mut lines = segments.into_iter().map(str::to_string);
    Some(Address {
        line1: lines.next(),
        line2: lines.next(),
        county,
        town: town.map(str::to_string),
        postcode: postcode.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_segments_and_drops_town() {
        let address = format_address(
            Some("1 High Street$Chapel Allerton$Leeds"),
            Some("LEEDS"),
            Some("LS7 4AA"),
        )
        .unwrap();

        assert_eq!(address.line1.as_deref(), Some("1 High Street"));
        assert_eq!(address.line2.as_deref(), Some("Chapel Allerton"));
        assert_eq!(address.county, None);
        assert_eq!(address.town.as_deref(), Some("LEEDS"));
        assert_eq!(address.postcode.as_deref(), Some("LS7 4AA"));
    }

    #[test]
    fn test_drops_consecutive_duplicates_and_empties() {
        let address = format_address(
            Some("Unit 4$ $unit 4$Mill Lane$$Mill  Lane"),
            None,
            None,
        )
        .unwrap();

        assert_eq!(address.line1.as_deref(), Some("Unit 4"));
        assert_eq!(address.line2.as_deref(), Some("Mill Lane"));
    }

    #[test]
    fn test_extracts_county() {
        let address = format_address(
            Some("The Surgery$north yorkshire$Church Road"),
            Some("Harrogate"),
            Some("HG1 1AA"),
        )
        .unwrap();

        assert_eq!(address.county.as_deref(), Some("North Yorkshire"));
        assert_eq!(address.line1.as_deref(), Some("The Surgery"));
        assert_eq!(address.line2.as_deref(), Some("Church Road"));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(format_address(None, Some("Leeds"), None).is_none());
        assert!(format_address(Some("   "), Some("Leeds"), None).is_none());
        assert!(format_address(Some(" Not  Available "), Some("Leeds"), None).is_none());
    }
}
