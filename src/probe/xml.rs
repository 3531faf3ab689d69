//! nmap `-oX` report parsing

use super::{RawHost, RawPort};
use crate::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NmapRun {
    #[serde(rename = "host", default)]
    hosts: Vec<XmlHost>,
}

#[derive(Debug, Deserialize)]
struct XmlHost {
    status: Option<XmlStatus>,
    #[serde(rename = "address", default)]
    addresses: Vec<XmlAddress>,
    hostnames: Option<XmlHostnames>,
    ports: Option<XmlPorts>,
    os: Option<XmlOs>,
    times: Option<XmlTimes>,
}

#[derive(Debug, Deserialize)]
struct XmlStatus {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct XmlAddress {
    #[serde(rename = "@addr")]
    addr: String,
    #[serde(rename = "@addrtype", default)]
    addrtype: String,
}

#[derive(Debug, Deserialize)]
struct XmlHostnames {
    #[serde(rename = "hostname", default)]
    hostnames: Vec<XmlHostname>,
}

#[derive(Debug, Deserialize)]
struct XmlHostname {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct XmlPorts {
    #[serde(rename = "port", default)]
    ports: Vec<XmlPort>,
}

#[derive(Debug, Deserialize)]
struct XmlPort {
    #[serde(rename = "@protocol")]
    protocol: Option<String>,
    #[serde(rename = "@portid")]
    portid: u16,
    state: XmlPortState,
    service: Option<XmlService>,
}

#[derive(Debug, Deserialize)]
struct XmlPortState {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct XmlService {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@product")]
    product: Option<String>,
    #[serde(rename = "@version")]
    version: Option<String>,
    #[serde(rename = "@extrainfo")]
    extra_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlOs {
    #[serde(rename = "osmatch", default)]
    matches: Vec<XmlOsMatch>,
}

#[derive(Debug, Deserialize)]
struct XmlOsMatch {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@accuracy")]
    accuracy: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct XmlTimes {
    /// Microseconds
    #[serde(rename = "@srtt")]
    srtt: Option<f64>,
}

/// Parse an nmap XML report into per-host records, keeping only open ports.
pub(crate) fn parse_nmap_xml(xml: &str) -> Result<Vec<RawHost>> {
    let run: NmapRun = quick_xml::de::from_str(xml)?;
    Ok(run.hosts.into_iter().map(RawHost::from).collect())
}

impl From<XmlHost> for RawHost {
    fn from(host: XmlHost) -> Self {
        let mac = host
            .addresses
            .into_iter()
            .find(|address| address.addrtype == "mac")
            .map(|address| address.addr);

        let hostnames = host
            .hostnames
            .map(|h| h.hostnames.into_iter().map(|n| n.name).collect())
            .unwrap_or_default();

        let open_ports = host
            .ports
            .map(|p| p.ports)
            .unwrap_or_default()
            .into_iter()
            .filter(|port| port.state.state == "open")
            .map(RawPort::from)
            .collect();

        // Highest accuracy wins, earliest listed on ties
        let os = host.os.and_then(|os| {
            os.matches
                .into_iter()
                .enumerate()
                .max_by_key(|(idx, m)| (m.accuracy.unwrap_or(0), std::cmp::Reverse(*idx)))
                .map(|(_, m)| m.name)
        });

        Self {
            status: host.status.map(|s| s.state),
            mac,
            hostnames,
            open_ports,
            os,
            rtt_ms: host.times.and_then(|t| t.srtt).map(|us| us / 1000.0),
        }
    }
}

impl From<XmlPort> for RawPort {
    fn from(port: XmlPort) -> Self {
        let (service, version) = match port.service {
            Some(service) => {
                let version = [service.product, service.version, service.extra_info]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                (service.name, (!version.is_empty()).then_some(version))
            }
            None => (None, None),
        };

        Self {
            port: port.portid,
            protocol: port.protocol,
            service,
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<?xml-stylesheet href="file:///usr/share/nmap/nmap.xsl" type="text/xsl"?>
<nmaprun scanner="nmap" args="nmap -T4 -p 1-100 -oX - 10.0.0.5" start="1700000000" version="7.94">
<scaninfo type="syn" protocol="tcp" numservices="100" services="1-100"/>
<verbose level="0"/>
<debugging level="0"/>
<hosthint><status state="up" reason="unknown-response" reason_ttl="0"/>
<address addr="10.0.0.5" addrtype="ipv4"/>
</hosthint>
<host starttime="1700000000" endtime="1700000002"><status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="10.0.0.5" addrtype="ipv4"/>
<address addr="00:1A:2B:3C:4D:5E" addrtype="mac" vendor="Acme"/>
<hostnames>
<hostname name="box.lan" type="PTR"/>
</hostnames>
<ports><extraports state="closed" count="97">
<extrareasons reason="reset" count="97" proto="tcp" ports="1-21,23-79,81-100"/>
</extraports>
<port protocol="tcp" portid="22"><state state="open" reason="syn-ack" reason_ttl="64"/><service name="ssh" product="OpenSSH" version="8.2p1" extrainfo="Ubuntu" method="probed" conf="10"/></port>
<port protocol="tcp" portid="80"><state state="open" reason="syn-ack" reason_ttl="64"/><service name="http" method="table" conf="3"/></port>
<port protocol="tcp" portid="99"><state state="filtered" reason="no-response" reason_ttl="0"/></port>
</ports>
<os><portused state="open" proto="tcp" portid="22"/>
<osmatch name="Linux 5.0 - 5.4" accuracy="98" line="1"><osclass type="general purpose" vendor="Linux" osfamily="Linux" osgen="5.X" accuracy="98"/></osmatch>
<osmatch name="Linux 4.15" accuracy="95" line="2"/>
</os>
<times srtt="1520" rttvar="300" to="100000"/>
</host>
<runstats><finished time="1700000002" timestr="now" summary="done" elapsed="2.10" exit="success"/><hosts up="1" down="0" total="1"/>
</runstats>
</nmaprun>
"#;

    #[test]
    fn test_parses_full_host() {
        let hosts = parse_nmap_xml(REPORT).unwrap();
        assert_eq!(hosts.len(), 1);

        let host = &hosts[0];
        assert_eq!(host.status.as_deref(), Some("up"));
        assert_eq!(host.mac.as_deref(), Some("00:1A:2B:3C:4D:5E"));
        assert_eq!(host.hostnames, vec!["box.lan"]);
        assert_eq!(host.os.as_deref(), Some("Linux 5.0 - 5.4"));
        assert!((host.rtt_ms.unwrap() - 1.52).abs() < 1e-9);

        let ports: Vec<u16> = host.open_ports.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![22, 80]);
        assert_eq!(host.open_ports[0].service.as_deref(), Some("ssh"));
        assert_eq!(host.open_ports[0].version.as_deref(), Some("OpenSSH 8.2p1 Ubuntu"));
        assert_eq!(host.open_ports[1].version, None);
    }

    #[test]
    fn test_no_hosts() {
        let hosts = parse_nmap_xml(
            r#"<?xml version="1.0"?><nmaprun scanner="nmap"><runstats><hosts up="0" down="0" total="0"/></runstats></nmaprun>"#,
        )
        .unwrap();
        assert!(hosts.is_empty());
    }

    #[test]
    fn test_down_host_without_optional_sections() {
        let hosts = parse_nmap_xml(
            r#"<nmaprun><host><status state="down" reason="no-response"/><address addr="10.9.9.9" addrtype="ipv4"/></host></nmaprun>"#,
        )
        .unwrap();
        assert_eq!(hosts[0].status.as_deref(), Some("down"));
        assert!(hosts[0].open_ports.is_empty());
        assert!(hosts[0].hostnames.is_empty());
        assert_eq!(hosts[0].os, None);
        assert_eq!(hosts[0].rtt_ms, None);
    }

    #[test]
    fn test_truncated_report_is_parse_error() {
        let err = parse_nmap_xml("<nmaprun><host><status state=").unwrap_err();
        assert!(matches!(err, crate::ScanError::ParseError(_)));
    }
}
