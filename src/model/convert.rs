//! Conversion from the intermediate representation

use std::collections::BTreeMap;

use tracing::debug;

use super::{
    ExposureEntry, FlowEntry, Index, MitigationEntry, ModelError, NamedEntry, ProjectModel,
    ThreatModelDocument,
};
use crate::domain::ConnectionType;
use crate::report::ReportDocument;

/// Assigns sequential indices to boundaries and components in first-seen order
struct Indexer<'a> {
    report: &'a ReportDocument,
    boundaries: BTreeMap<String, Index>,
    /// (boundary id, component id) -> index
    components: BTreeMap<(String, String), Index>,
    boundary_entries: BTreeMap<Index, NamedEntry>,
    component_entries: BTreeMap<Index, NamedEntry>,
}

impl<'a> Indexer<'a> {
    fn new(report: &'a ReportDocument) -> Self {
        Self {
            report,
            boundaries: BTreeMap::new(),
            components: BTreeMap::new(),
            boundary_entries: BTreeMap::new(),
            component_entries: BTreeMap::new(),
        }
    }

    fn boundary(&mut self, id: &str) -> Index {
        if let Some(&index) = self.boundaries.get(id) {
            return index;
        }
        let index = self.boundaries.len();
        let name = self
            .report
            .boundaries
            .get(id)
            .map_or(id, |b| b.name.as_str());
        self.boundaries.insert(id.to_string(), index);
        self.boundary_entries.insert(index, NamedEntry::new(name));
        index
    }

    /// Index of a component and of its boundary
    fn component(&mut self, boundary_id: &str, id: &str) -> (Index, Index) {
        let boundary = self.boundary(boundary_id);
        let key = (boundary_id.to_string(), id.to_string());
        if let Some(&index) = self.components.get(&key) {
            return (boundary, index);
        }
        let index = self.components.len();
        let name = self
            .report
            .component(boundary_id, id)
            .map_or(id, |c| c.name.as_str());
        self.components.insert(key, index);
        self.component_entries.insert(index, NamedEntry::new(name));
        (boundary, index)
    }
}

impl ThreatModelDocument {
    /// Convert one project of an intermediate document
    ///
    /// Every boundary and component referenced by the project's exposures,
    /// mitigations and the data flow diagram gets an index. Threats missing
    /// from the catalog are added under their own identifier so the result
    /// always passes [`ThreatModelDocument::check`].
    pub fn from_report(report: &ReportDocument, project: &str) -> Result<Self, ModelError> {
        let source = report
            .projects
            .get(project)
            .ok_or_else(|| ModelError::UnknownProject(project.to_string()))?;

        let mut threats: BTreeMap<String, String> = report
            .threats
            .iter()
            .map(|(id, threat)| (id.clone(), threat.name.clone()))
            .collect();
        let mut use_threat = |id: &str| {
            threats
                .entry(id.to_string())
                .or_insert_with(|| id.to_string());
            id.to_string()
        };

        let mut indexer = Indexer::new(report);
        let mut model = ProjectModel::default();

        for exposure in source.exposures.values().flatten() {
            let (boundary, component) = indexer.component(&exposure.boundary, &exposure.component);
            let index = model.exposes.len();
            model.exposes.insert(
                index,
                ExposureEntry {
                    boundary,
                    component,
                    exposure: exposure.exposure.clone(),
                    refs: exposure.refs.clone(),
                    threat: use_threat(&exposure.threat),
                },
            );
        }

        for mitigation in source.mitigations.values().flatten() {
            let (boundary, component) =
                indexer.component(&mitigation.boundary, &mitigation.component);
            let index = model.mitigates.len();
            model.mitigates.insert(
                index,
                MitigationEntry {
                    boundary,
                    component,
                    mitigation: mitigation.mitigation.clone(),
                    refs: mitigation.refs.clone(),
                    threat: use_threat(&mitigation.threat),
                },
            );
        }

        for connection in report.dfd.connections() {
            let (srcboundary, srccomponent) =
                indexer.component(&connection.source_boundary, &connection.source_component);
            let (dstboundary, dstcomponent) =
                indexer.component(&connection.dest_boundary, &connection.dest_component);
            let message = connection.edge.name.unwrap_or_default();
            let mut flows = vec![FlowEntry {
                srcboundary,
                srccomponent,
                dstboundary,
                dstcomponent,
                message: message.clone(),
            }];
            // sends are directed, so a bidirectional edge is two flows
            if connection.edge.connection_type == ConnectionType::Bi {
                flows.push(FlowEntry {
                    srcboundary: dstboundary,
                    srccomponent: dstcomponent,
                    dstboundary: srcboundary,
                    dstcomponent: srccomponent,
                    message,
                });
            }
            for flow in flows {
                let index = model.sends.len();
                model.sends.insert(index, flow);
            }
        }

        debug!(
            "Converted project '{}': {} boundaries, {} components, {} exposures, {} flows, {} mitigations",
            project,
            indexer.boundary_entries.len(),
            indexer.component_entries.len(),
            model.exposes.len(),
            model.sends.len(),
            model.mitigates.len()
        );

        let mut doc = ThreatModelDocument::default();
        doc.boundaries
            .insert(project.to_string(), indexer.boundary_entries);
        doc.components
            .insert(project.to_string(), indexer.component_entries);
        doc.models.insert(project.to_string(), model);
        doc.threats = threats;
        Ok(doc)
    }
}
