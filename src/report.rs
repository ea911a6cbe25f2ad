use crate::store::IpRecord;
use json::JsonValue;
use std::{cmp::Ordering, collections::HashMap, fmt};

/// Addresses need more than this many requests to be reported.
pub const DEFAULT_MIN_REQUESTS: u64 = 1;

/// One reported address with its port table, ports in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpSummary {
    pub ip: String,
    pub request_count: u64,
    pub ports: Vec<(String, u64)>,
}

/// The finished view of a run, built once every scanner is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub ips: Vec<IpSummary>,
    pub total_requests: u64,
    pub port_totals: HashMap<String, u64>,
    pub most_requested_port: Option<String>,
}

impl Report {
    /// Reduce the records to a report. Only records with `request_count > min_requests` are counted,
    /// which also leaves out the `unknown` record since its request count never moves.
    pub fn from_records(records: &HashMap<String, IpRecord>, min_requests: u64) -> Self {
        let mut report = Report::default();
        for (ip, record) in records {
            if record.request_count <= min_requests {
                continue;
            }
            let mut ports: Vec<_> = record.port_counts.iter().map(|(port, &count)| (port.clone(), count)).collect();
            ports.sort_by(|(a, _), (b, _)| compare_ports(a, b));
            for (port, count) in &ports {
                *report.port_totals.entry(port.clone()).or_default() += count;
            }
            report.total_requests += record.request_count;
            report.ips.push(IpSummary {
                ip: ip.clone(),
                request_count: record.request_count,
                ports,
            });
        }
        report.ips.sort_by(|a, b| a.ip.cmp(&b.ip));
        report.most_requested_port = most_requested_port(&report.port_totals);
        report
    }

    pub fn to_json(&self) -> JsonValue {
        let ips = self
            .ips
            .iter()
            .map(|summary| {
                let mut ports = JsonValue::new_object();
                for (port, count) in &summary.ports {
                    ports[port.as_str()] = (*count).into();
                }
                let mut ip = JsonValue::new_object();
                ip["ip"] = summary.ip.as_str().into();
                ip["requests"] = summary.request_count.into();
                ip["ports"] = ports;
                ip
            })
            .collect();
        let mut report = JsonValue::new_object();
        report["ips"] = JsonValue::Array(ips);
        report["total_requests"] = self.total_requests.into();
        report["most_requested_port"] = match &self.most_requested_port {
            Some(port) => port.as_str().into(),
            None => JsonValue::Null,
        };
        report
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for summary in &self.ips {
            writeln!(f, "IP: {}\tAmount of requests: {}\n", summary.ip, summary.request_count)?;
            writeln!(f, "\tPort Number\tAmount")?;
            for (port, count) in &summary.ports {
                writeln!(f, "\t{}\t\t{}", port, count)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "\nTotal amount of requests: {}", self.total_requests)?;
        write!(f, "Most requested port: {}", self.most_requested_port.as_deref().unwrap_or("none"))
    }
}

/// Ports compare by number, then by text so `"022"` and `"22"` still have a fixed order.
fn compare_ports(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// The port with the highest total. Ties go to the lowest port number.
pub fn most_requested_port(port_totals: &HashMap<String, u64>) -> Option<String> {
    port_totals
        .iter()
        .max_by(|(port_a, count_a), (port_b, count_b)| {
            count_a.cmp(count_b).then_with(|| compare_ports(port_b, port_a))
        })
        .map(|(port, _)| port.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UNKNOWN_IP;
    use maplit::hashmap;

    fn record(ports: HashMap<String, u64>) -> IpRecord {
        IpRecord {
            request_count: ports.values().sum(),
            port_counts: ports,
        }
    }

    #[test]
    fn test_single_hit_addresses_are_left_out() {
        let records = hashmap! {
            String::from("10.0.0.1") => record(hashmap! { String::from("22") => 1 }),
            String::from("10.0.0.2") => record(hashmap! { String::from("80") => 2 }),
            UNKNOWN_IP.to_owned() => IpRecord {
                request_count: 0,
                port_counts: hashmap! { String::from("443") => 50 },
            },
        };
        let report = Report::from_records(&records, DEFAULT_MIN_REQUESTS);
        assert_eq!(report.ips.len(), 1);
        assert_eq!(report.ips[0].ip, "10.0.0.2");
        assert_eq!(report.total_requests, 2);
        assert_eq!(report.port_totals, hashmap! { String::from("80") => 2 });
        assert_eq!(report.most_requested_port.as_deref(), Some("80"));
    }

    #[test]
    fn test_ports_fold_across_addresses() {
        let records = hashmap! {
            String::from("127.0.0.1") => record(hashmap! { String::from("22") => 8, String::from("23") => 2 }),
            String::from("127.0.0.2") => record(hashmap! { String::from("23") => 2 }),
        };
        let report = Report::from_records(&records, DEFAULT_MIN_REQUESTS);
        assert_eq!(report.total_requests, 12);
        assert_eq!(report.port_totals, hashmap! { String::from("22") => 8, String::from("23") => 4 });
        assert_eq!(report.most_requested_port.as_deref(), Some("22"));
        assert_eq!(report.ips[0].ports, vec![(String::from("22"), 8), (String::from("23"), 2)]);
    }

    #[test]
    fn test_ties_go_to_lowest_port() {
        let totals = hashmap! {
            String::from("8080") => 3,
            String::from("443") => 3,
            String::from("1000") => 3,
            String::from("22") => 1,
        };
        for _ in 0..10 {
            assert_eq!(most_requested_port(&totals).as_deref(), Some("443"));
        }
    }

    #[test]
    fn test_empty_report() {
        let report = Report::from_records(&HashMap::new(), DEFAULT_MIN_REQUESTS);
        assert_eq!(report.total_requests, 0);
        assert_eq!(report.most_requested_port, None);
        assert_eq!(report.to_string(), "\nTotal amount of requests: 0\nMost requested port: none");
        assert!(report.to_json()["most_requested_port"].is_null());
    }

    #[test]
    fn test_min_requests_threshold() {
        let records = hashmap! {
            String::from("10.0.0.1") => record(hashmap! { String::from("22") => 3 }),
            String::from("10.0.0.2") => record(hashmap! { String::from("22") => 5 }),
        };
        let report = Report::from_records(&records, 3);
        assert_eq!(report.ips.len(), 1);
        assert_eq!(report.total_requests, 5);
    }

    #[test]
    fn test_text_layout() {
        let records = hashmap! {
            String::from("127.0.0.2") => record(hashmap! { String::from("23") => 2 }),
        };
        let text = Report::from_records(&records, DEFAULT_MIN_REQUESTS).to_string();
        assert_eq!(
            text,
            "IP: 127.0.0.2\tAmount of requests: 2\n\n\tPort Number\tAmount\n\t23\t\t2\n\n\
             \nTotal amount of requests: 2\nMost requested port: 23"
        );
    }

    #[test]
    fn test_json_layout() {
        let records = hashmap! {
            String::from("127.0.0.1") => record(hashmap! { String::from("22") => 8, String::from("23") => 2 }),
        };
        let json = Report::from_records(&records, DEFAULT_MIN_REQUESTS).to_json();
        assert_eq!(json["total_requests"], 10);
        assert_eq!(json["most_requested_port"], "22");
        assert_eq!(json["ips"][0]["ip"], "127.0.0.1");
        assert_eq!(json["ips"][0]["requests"], 10);
        assert_eq!(json["ips"][0]["ports"]["23"], 2);
    }
}
