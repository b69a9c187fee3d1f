//! Connected-component labeling over boolean masks.
//!
//! Cells are connected through their four edge neighbours (von Neumann
//! neighbourhood). The scan runs row-major and every region receives the
//! next label when its first cell is met, so labeling is deterministic.

/// Pixel bounding box of a cluster, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterExtent {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl ClusterExtent {
    fn single(row: usize, col: usize) -> Self {
        Self {
            min_row: row,
            min_col: col,
            max_row: row,
            max_col: col,
        }
    }

    fn include(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }
}

/// Result of labeling a mask.
///
/// Label 0 marks cells outside the mask; clusters are numbered from 1.
#[derive(Debug, Clone)]
pub struct Labeling {
    width: usize,
    height: usize,
    labels: Vec<u32>,
    /// Member count per label; index 0 holds the background count.
    sizes: Vec<usize>,
    /// Extent per label; index 0 is unused.
    extents: Vec<Option<ClusterExtent>>,
}

impl Labeling {
    /// Number of clusters (excluding the background).
    pub fn num_clusters(&self) -> usize {
        self.sizes.len() - 1
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major labels.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label of the cell at `(row, col)`.
    pub fn label_at(&self, row: usize, col: usize) -> u32 {
        self.labels[row * self.width + col]
    }

    /// Member count of a label (label 0 gives the background count).
    pub fn size(&self, label: u32) -> usize {
        self.sizes.get(label as usize).copied().unwrap_or(0)
    }

    /// Member counts of clusters 1..=n.
    pub fn cluster_sizes(&self) -> &[usize] {
        &self.sizes[1..]
    }

    /// Pixel extent of a cluster.
    pub fn extent(&self, label: u32) -> Option<ClusterExtent> {
        self.extents.get(label as usize).copied().flatten()
    }

    /// Labels of clusters with fewer than `min_size` members.
    pub fn small_clusters(&self, min_size: usize) -> Vec<u32> {
        self.cluster_sizes()
            .iter()
            .enumerate()
            .filter(|(_, &count)| count < min_size)
            .map(|(i, _)| (i + 1) as u32)
            .collect()
    }
}

/// Label the 4-connected regions of `mask` (row-major, `width` columns).
pub fn label_clusters(mask: &[bool], width: usize, height: usize) -> Labeling {
    debug_assert_eq!(mask.len(), width * height);

    let mut labels = vec![0u32; mask.len()];
    let mut sizes = vec![0usize];
    let mut extents: Vec<Option<ClusterExtent>> = vec![None];
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || labels[start] != 0 {
            continue;
        }

        let label = sizes.len() as u32;
        let mut count = 0usize;
        let mut extent = ClusterExtent::single(start / width, start % width);

        labels[start] = label;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            count += 1;
            let row = idx / width;
            let col = idx % width;
            extent.include(row, col);

            let mut visit = |n: usize| {
                if mask[n] && labels[n] == 0 {
                    labels[n] = label;
                    stack.push(n);
                }
            };

            if row > 0 {
                visit(idx - width);
            }
            if row + 1 < height {
                visit(idx + width);
            }
            if col > 0 {
                visit(idx - 1);
            }
            if col + 1 < width {
                visit(idx + 1);
            }
        }

        sizes.push(count);
        extents.push(Some(extent));
    }

    sizes[0] = mask.iter().filter(|&&m| !m).count();

    Labeling {
        width,
        height,
        labels,
        sizes,
        extents,
    }
}
