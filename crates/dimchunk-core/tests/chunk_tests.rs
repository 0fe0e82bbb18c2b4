#[cfg(test)]
mod tests {
    use dimchunk::{
        shape, ChunkPlan, DeviceKind, InvalidArgument, Materialize, NdSbp, OperationError,
        Placement, Shape, Tensor,
    };
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_strategy::{proptest, Arbitrary};

    fn randn(shape: Shape, seed: u64) -> Tensor<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..shape.numel())
            .map(|_| rng.gen_range(-1f32..1f32))
            .collect::<Vec<_>>();
        Tensor::from_data(data, shape).unwrap()
    }

    #[test]
    fn chunk_shapes_match_torch() {
        let _ = env_logger::builder().is_test(true).try_init();
        let input = randn(shape![5, 3, 6, 9], 0);

        let out = input.chunk(3, 2).unwrap();
        let shapes = out.iter().map(|t| t.shape().clone()).collect::<Vec<_>>();
        assert_eq!(shapes, vec![shape![5, 3, 2, 9]; 3]);

        let out = input.chunk(4, 3).unwrap();
        let shapes = out.iter().map(|t| t.shape().clone()).collect::<Vec<_>>();
        assert_eq!(shapes, vec![shape![5, 3, 6, 3]; 3]);
    }

    #[test]
    fn chunk_rejects_bad_arguments() {
        let input = randn(shape![5, 3, 6, 9], 1);
        assert!(matches!(
            input.chunk(2, 5),
            Err(OperationError::InvalidArgument(
                InvalidArgument::DimOutOfRange { dim: 5, rank: 4 }
            ))
        ));
        assert!(matches!(
            input.chunk(0, 0),
            Err(OperationError::InvalidArgument(InvalidArgument::ZeroChunks))
        ));
    }

    #[test]
    fn chunk_views_hold_expected_values() {
        let input = Tensor::<u32>::arange(shape![3, 4]);
        let cols = input.chunk(3, -1).unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].to_vec(), vec![0, 1, 4, 5, 8, 9]);
        assert_eq!(cols[1].to_vec(), vec![2, 3, 6, 7, 10, 11]);
    }

    #[test]
    fn plan_applies_to_any_materializer() {
        let input = randn(shape![4, 10], 2);
        let plan = ChunkPlan::chunk(input.shape(), 1, 4).unwrap();
        let views = input.apply_plan(&plan).unwrap();
        let widths = views.iter().map(|v| v.shape()[1]).collect::<Vec<_>>();
        assert_eq!(widths, vec![3, 3, 3, 1]);
    }

    #[test]
    fn shards_reassemble_logical_tensor() {
        let logical = randn(shape![7, 5], 3);
        let placement = Placement::flat(DeviceKind::Cpu, vec![0, 1, 2]).unwrap();
        let nd: NdSbp = "S(0)".parse().unwrap();
        let shards = placement
            .ranks()
            .iter()
            .map(|&rank| {
                let spec = placement.local_spec(logical.shape(), &nd, rank).unwrap();
                logical.slice(&spec).unwrap()
            })
            .collect::<Vec<_>>();
        let rows = shards.iter().map(|s| s.shape()[0]).collect::<Vec<_>>();
        assert_eq!(rows, vec![3, 3, 1]);
        assert_eq!(Tensor::cat(&shards, 0).unwrap(), logical);
    }

    #[derive(Arbitrary, Debug)]
    struct RoundTripProblem {
        #[strategy(prop::collection::vec(1usize..=8, 1..=4))]
        dims: Vec<usize>,
        #[strategy(0..#dims.len())]
        dim: usize,
        #[strategy(1usize..=10)]
        chunks: usize,
        seed: u64,
    }

    #[proptest(cases = 64)]
    fn chunk_then_cat_is_identity(prob: RoundTripProblem) {
        let RoundTripProblem {
            dims,
            dim,
            chunks,
            seed,
        } = prob;
        let input = randn(Shape::from(dims), seed);
        let pieces = input.chunk(chunks, dim as isize).unwrap();
        let extent: usize = pieces.iter().map(|p| p.shape()[dim]).sum();
        prop_assert_eq!(extent, input.shape()[dim]);
        let rebuilt = Tensor::cat(&pieces, dim as isize).unwrap();
        prop_assert_eq!(rebuilt, input);
    }
}
